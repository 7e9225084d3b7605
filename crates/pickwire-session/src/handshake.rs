use std::io::Write;

use pickwire_frame::FrameWriter;
use tracing::info;

use crate::error::{Result, SessionError};

/// Identification string the controller expects from a robot client.
pub const DEFAULT_BRAND: &str = "ABB_IRB/1.8.0XXXXXXXXXXX";

const MAX_BRAND_LEN: usize = 64;

/// Write the brand identification string.
///
/// The controller does not answer it; requests may follow immediately.
pub fn send_brand<W: Write>(writer: &mut FrameWriter<W>, brand: &str) -> Result<()> {
    validate_brand(brand)?;
    writer.send_raw(brand.as_bytes())?;
    info!(brand, "sent brand identification");
    Ok(())
}

fn validate_brand(brand: &str) -> Result<()> {
    if brand.is_empty() {
        return Err(SessionError::HandshakeFailed(
            "brand identification must not be empty".to_string(),
        ));
    }
    if brand.len() > MAX_BRAND_LEN {
        return Err(SessionError::HandshakeFailed(format!(
            "brand identification too long: {} (max {MAX_BRAND_LEN})",
            brand.len()
        )));
    }
    if !brand.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(SessionError::HandshakeFailed(
            "brand identification must be printable ASCII without spaces".to_string(),
        ));
    }
    Ok(())
}
