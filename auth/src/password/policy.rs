use super::errors::PasswordError;

/// Requirements a plaintext password must meet before it is hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl PasswordPolicy {
    pub const DEFAULT_MIN_LENGTH: usize = 8;

    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Check a plaintext password against the policy.
    ///
    /// Length is counted in characters, not bytes.
    ///
    /// # Errors
    /// * `PolicyViolation` - Password is shorter than the minimum length
    pub fn check(&self, password: &str) -> Result<(), PasswordError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(PasswordError::PolicyViolation(format!(
                "minimum {} characters, got {}",
                self.min_length, length
            )));
        }
        Ok(())
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_LENGTH)
    }
}
