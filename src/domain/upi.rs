use crate::error::PaymentError;

/// Checks a UPI handle such as `asha@okbank`. Only presence and the `@`
/// separator are checked; the handle is never resolved.
pub fn validate_address(address: &str) -> Result<(), PaymentError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(PaymentError::MissingAddress);
    }
    if !address.contains('@') {
        return Err(PaymentError::InvalidAddress);
    }
    Ok(())
}
