//! Execution mode for forward passes

/// Training vs. evaluation mode
///
/// Dropout is only applied while training; evaluation passes are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    training: bool,
}

impl Context {
    /// Create a context in training mode
    pub fn new() -> Self {
        Self { training: true }
    }

    /// Create a context in evaluation mode
    pub fn evaluation() -> Self {
        Self { training: false }
    }

    /// Set training mode
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Set evaluation mode
    pub fn eval(&mut self) {
        self.training = false;
    }

    /// Check if in training mode
    pub fn is_training(&self) -> bool {
        self.training
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_defaults_to_training() {
        assert!(Context::default().is_training());
    }

    #[test]
    fn test_context_evaluation() {
        assert!(!Context::evaluation().is_training());
    }

    #[test]
    fn test_context_toggle() {
        let mut ctx = Context::new();
        ctx.eval();
        assert!(!ctx.is_training());
        ctx.train();
        assert!(ctx.is_training());
    }
}
