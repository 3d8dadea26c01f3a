use tracing::warn;

/// Where the calling code runs.
///
/// Passed in explicitly so the server-side guard can be exercised without a
/// browser. [`ExecutionContext::detect`] gives a compile-time best guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A backend process. Secrets are acceptable here.
    Server,
    /// A browser-like environment. Anything done here is visible to the end
    /// user.
    Browser,
}

impl ExecutionContext {
    /// `Browser` when compiled for `wasm32-unknown-unknown`, `Server`
    /// otherwise.
    pub fn detect() -> Self {
        if cfg!(all(target_arch = "wasm32", target_os = "unknown")) {
            ExecutionContext::Browser
        } else {
            ExecutionContext::Server
        }
    }

    pub fn is_browser(self) -> bool {
        matches!(self, ExecutionContext::Browser)
    }

    /// Fail if running in a browser-like context.
    pub fn ensure_server(self, operation: &'static str) -> Result<(), InsecureContext> {
        match self {
            ExecutionContext::Server => Ok(()),
            ExecutionContext::Browser => Err(InsecureContext { operation }),
        }
    }
}

/// A secret-handling operation was called from a browser-like context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} should only be used server-side; it would leak the secret key to the client")]
pub struct InsecureContext {
    /// Name of the refused operation.
    pub operation: &'static str,
}

/// Execution context plus the caller's explicit override for token minting.
///
/// The override exists for tests and trusted tooling. It is advisory: it
/// bypasses the guard, and a malicious caller can always set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningContext {
    pub execution: ExecutionContext,
    pub allow_insecure_context: bool,
}

impl SigningContext {
    /// Detected execution context, no override.
    pub fn detect() -> Self {
        Self {
            execution: ExecutionContext::detect(),
            allow_insecure_context: false,
        }
    }

    /// Explicit server context.
    pub fn server() -> Self {
        Self {
            execution: ExecutionContext::Server,
            allow_insecure_context: false,
        }
    }

    /// Explicit browser context, no override.
    pub fn browser() -> Self {
        Self {
            execution: ExecutionContext::Browser,
            allow_insecure_context: false,
        }
    }

    /// Permit minting even in a browser context.
    pub fn allow_insecure(mut self) -> Self {
        self.allow_insecure_context = true;
        self
    }

    pub(crate) fn check(&self, operation: &'static str) -> Result<(), InsecureContext> {
        match self.execution.ensure_server(operation) {
            Ok(()) => Ok(()),
            Err(_) if self.allow_insecure_context => {
                warn!(operation, "signing in a browser context; secret is exposed to the client");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for SigningContext {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_build_detects_server() {
        assert_eq!(ExecutionContext::detect(), ExecutionContext::Server);
        assert!(!SigningContext::detect().allow_insecure_context);
    }

    #[test]
    fn browser_context_is_refused() {
        let err = SigningContext::browser().check("createMagicLink").unwrap_err();
        assert_eq!(err.operation, "createMagicLink");
        assert!(err.to_string().contains("server-side"));
    }

    #[test]
    fn override_permits_browser_context() {
        assert!(SigningContext::browser()
            .allow_insecure()
            .check("createMagicLink")
            .is_ok());
    }

    #[test]
    fn server_context_needs_no_override() {
        assert!(SigningContext::server().check("createMagicLink").is_ok());
    }
}
