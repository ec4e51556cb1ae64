//! Next-page cursor bookkeeping for the paginated listings.

use std::collections::HashSet;

use crate::domain::{ProviderError, ScanError};

/// Position in one paginated listing.
///
/// Remembers every token the provider handed out so a listing that loops
/// back on itself fails instead of running forever.
#[derive(Debug, Default)]
pub struct PageCursor {
    current: Option<String>,
    seen: HashSet<String>,
}

impl PageCursor {
    /// Token for the next request; `None` asks for the first page.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Step to the page after the one just fetched. Returns `false` once
    /// the listing is complete.
    ///
    /// # Errors
    ///
    /// `ProviderError::Decode` when `next` was already returned by an
    /// earlier page of the same listing.
    pub fn advance(&mut self, operation: &str, next: Option<String>) -> Result<bool, ScanError> {
        let Some(next) = next.filter(|token| !token.is_empty()) else {
            self.current = None;
            return Ok(false);
        };
        if !self.seen.insert(next.clone()) {
            tracing::warn!(operation, token = %next, "provider repeated a page token");
            return Err(ProviderError::Decode(format!(
                "{operation}: page token {next} was already returned"
            ))
            .into());
        }
        self.current = Some(next);
        Ok(true)
    }
}
