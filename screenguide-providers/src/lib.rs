//! Request builders and response parsers for the hosted speech and model APIs.
//!
//! Builders are pure (they return an [`request::HttpRequest`]); only
//! [`runtime::execute`] touches the network.

pub mod gemini;
pub mod google_speech;
pub mod google_tts;
pub mod parse;
pub mod request;
pub mod runtime;
