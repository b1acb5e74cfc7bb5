//! Cookie-based JWT authorizer for API gateway invocations.
//!
//! Given an inbound gateway event carrying a browser cookie, the authorizer
//! extracts the `id_token` cookie, resolves the signing key from the
//! identity provider's published JWKS, verifies the token's signature and
//! standard claims under RS256, and emits an IAM-style allow decision scoped
//! to the invoked resource. Every failure collapses into a single opaque
//! `Unauthorized` signal at the boundary; the differentiated failure kind is
//! logged first so operators can tell configuration bugs from genuine auth
//! failures.
//!
//! ```no_run
//! use gateway_authorizer::{Authorizer, AuthorizerConfig, AuthorizerEvent};
//!
//! # async fn example(event: AuthorizerEvent) -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthorizerConfig::new("eu-west-1", "eu-west-1_Pool123", "client-abc");
//! let authorizer = Authorizer::new(config)?;
//!
//! match authorizer.handle(&event).await {
//!     Ok(decision) => println!("{}", serde_json::to_string(&decision)?),
//!     Err(unauthorized) => eprintln!("{unauthorized}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod authorizer;
pub mod config;
pub mod cookie;
pub mod error;
pub mod event;
pub mod jwks;
pub mod validator;

pub use authorizer::Authorizer;
pub use config::{AuthorizerConfig, IntegrationMode};
pub use cookie::CookieJar;
pub use error::{AuthError, Result, Unauthorized};
pub use event::{AuthorizerEvent, AuthorizerResponse, Effect, PolicyDocument, Statement};
pub use jwks::JwksCache;
pub use validator::{validate_id_token, Claims};
