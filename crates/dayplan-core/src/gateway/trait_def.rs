//! The `Generator` trait -- the adapter interface for plan generators.
//!
//! Each concrete backend (Gemini, fixtures) implements this trait. It is
//! object-safe so a [`super::GenerationGateway`] can hold any backend as
//! `Arc<dyn Generator>`.

use async_trait::async_trait;
use serde_json::Value;

use super::GenerationError;

/// A service that turns a prompt into JSON text conforming to `schema`.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Whether output is canned rather than model-generated. Cache entries
    /// resolved by a synthetic generator are flagged as such.
    fn is_synthetic(&self) -> bool {
        false
    }

    /// Fail fast when the generator cannot possibly succeed (e.g. missing
    /// credentials), before any cache state is touched.
    fn ensure_available(&self) -> Result<(), GenerationError> {
        Ok(())
    }

    /// Generate a response for `prompt`. Returns the raw JSON text.
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, GenerationError>;
}

// Compile-time assertion: Generator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Generator) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str, _schema: &Value) -> Result<String, GenerationError> {
            Ok(prompt.to_owned())
        }
    }

    #[tokio::test]
    async fn generator_is_object_safe_with_defaults() {
        let generator: Box<dyn Generator> = Box::new(EchoGenerator);
        assert_eq!(generator.name(), "echo");
        assert!(!generator.is_synthetic());
        assert!(generator.ensure_available().is_ok());
        let out = generator.generate("{}", &Value::Null).await.unwrap();
        assert_eq!(out, "{}");
    }
}
