//! The operation descriptor: every backend call the worker knows how to make.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;

/// A supported backend operation, keyed on the wire by its `api_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Retrieve max context length.
    TrueMaxContextLength,
    /// Retrieve backend version.
    Version,
    /// KoboldAI United compatible generation.
    Generate,
    /// Incremental generation over server-sent events.
    GenerateStream,
    CheckGenerate,
    TokenCount,
    AbortGenerate,
    Transcribe,
    Txt2Img,
    Img2Img,
    Interrogate,
}

/// HTTP verb used for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn as_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
        }
    }
}

impl Operation {
    /// Every operation, in table order.
    pub const ALL: [Operation; 11] = [
        Operation::TrueMaxContextLength,
        Operation::Version,
        Operation::Generate,
        Operation::GenerateStream,
        Operation::CheckGenerate,
        Operation::TokenCount,
        Operation::AbortGenerate,
        Operation::Transcribe,
        Operation::Txt2Img,
        Operation::Img2Img,
        Operation::Interrogate,
    ];

    /// The `api_name` callers use for this operation.
    pub fn api_name(self) -> &'static str {
        match self {
            Operation::TrueMaxContextLength => "true_max_context_length",
            Operation::Version => "version",
            Operation::Generate => "generate",
            Operation::GenerateStream => "generate_stream",
            Operation::CheckGenerate => "check_generate",
            Operation::TokenCount => "token_count",
            Operation::AbortGenerate => "abort_generate",
            Operation::Transcribe => "transcribe",
            Operation::Txt2Img => "txt2img",
            Operation::Img2Img => "img2img",
            Operation::Interrogate => "interrogate",
        }
    }

    pub fn verb(self) -> Verb {
        match self {
            Operation::TrueMaxContextLength | Operation::Version => Verb::Get,
            _ => Verb::Post,
        }
    }

    /// Backend path, relative to the configured base URL.
    pub fn path(self) -> &'static str {
        match self {
            Operation::TrueMaxContextLength => "/api/extra/true_max_context_length",
            Operation::Version => "/api/extra/version",
            Operation::Generate => "/api/v1/generate",
            Operation::GenerateStream => "/api/extra/generate/stream",
            Operation::CheckGenerate => "/api/extra/generate/check",
            Operation::TokenCount => "/api/extra/tokencount",
            Operation::AbortGenerate => "/api/extra/abort",
            Operation::Transcribe => "/api/extra/transcribe",
            Operation::Txt2Img => "/sdapi/v1/txt2img",
            Operation::Img2Img => "/sdapi/v1/img2img",
            Operation::Interrogate => "/sdapi/v1/interrogate",
        }
    }

    pub fn is_streaming(self) -> bool {
        matches!(self, Operation::GenerateStream)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Returned when an `api_name` is not in the descriptor table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.api_name() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}
