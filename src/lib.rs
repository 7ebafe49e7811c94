//! Connect a CRM through a hosted integration gateway and relay validated
//! contacts into it.

pub mod config;
pub mod error;
pub mod form;
pub mod integrations;
pub mod presenter;
pub mod session;

pub use config::AppConfig;
pub use error::{GatewayError, SessionError};
pub use form::{ContactInput, FormField, RawFormFields, ValidationResult};
pub use integrations::gateway::{AuthorizationOutcome, GatewayClient};
pub use integrations::{ProviderId, RunResult, CREATE_CONTACT_FLOW};
pub use presenter::{present, DisplayFacts, Outcome};
pub use session::{ConnectionState, Session, SubmissionState};
