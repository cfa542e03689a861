//! Input validation for kernel intents.

use crate::address::Address;
use crate::error::ValidationError;
use crate::types::Scheme;

/// Content must be non-empty.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(())
}

/// Amounts must be strictly positive.
pub fn validate_amount(amount: u64) -> Result<(), ValidationError> {
    if amount == 0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(())
}

/// A did must parse as a `did:xhe:` address.
pub fn validate_did(did: &str) -> Result<(), ValidationError> {
    match Address::parse(did) {
        Ok(address) if address.scheme() == Scheme::Identity => Ok(()),
        _ => Err(ValidationError::InvalidDid(did.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content() {
        assert_eq!(validate_content(""), Err(ValidationError::EmptyContent));
        assert!(validate_content(" ").is_ok());
        assert!(validate_content("hello").is_ok());
    }

    #[test]
    fn test_amount() {
        assert_eq!(validate_amount(0), Err(ValidationError::NonPositiveAmount));
        assert!(validate_amount(1).is_ok());
    }

    #[test]
    fn test_did() {
        assert!(validate_did("did:xhe:0123456789abcdef0123456789abcdef").is_ok());
        assert!(validate_did("did:xhe:").is_err());
        assert!(validate_did("did:xhe:XYZ").is_err());
        assert!(validate_did("xhe://abcd").is_err());
        assert!(validate_did("alice").is_err());
    }
}
