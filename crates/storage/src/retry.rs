// SPDX-License-Identifier: MIT

//! Retry-with-backoff for transient SQLite busy/lock errors, per the chat
//! store's contract: base 100 ms, exponential, up to 5 retries.

use crate::error::ChatStoreError;
use rusqlite::ErrorCode;
use std::thread::sleep;
use std::time::Duration;
use tracing::debug;

const MAX_RETRIES: u32 = 5;
const BASE_DELAY: Duration = Duration::from_millis(100);

fn is_transient(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked))
}

/// Runs `op`, retrying on `SQLITE_BUSY`/`SQLITE_LOCKED` with exponential
/// backoff before surfacing the error.
pub fn with_retry<T>(mut op: impl FnMut() -> rusqlite::Result<T>) -> Result<T, ChatStoreError> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && attempt < MAX_RETRIES => {
                let delay = BASE_DELAY * 2u32.pow(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying after transient sqlite error");
                sleep(delay);
                attempt += 1;
            }
            Err(err) if is_transient(&err) => return Err(ChatStoreError::Busy),
            Err(err) => return Err(err.into()),
        }
    }
}
