use crate::retry::RetryClass;

/// A stable, public error code. The `code` string is part of the wire
/// contract; the HTTP status is what edge handlers answer with when the
/// error surfaces as a response body rather than a redirect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Code {
    pub code: &'static str,
    pub http_status: u16,
    pub retry: RetryClass,
}

pub const AUTH_UNAUTHENTICATED: Code = Code {
    code: "AUTH.UNAUTHENTICATED",
    http_status: 401,
    retry: RetryClass::None,
};

pub const AUTH_FORBIDDEN: Code = Code {
    code: "AUTH.FORBIDDEN",
    http_status: 403,
    retry: RetryClass::None,
};

pub const AUTH_PROVIDER_UNREACHABLE: Code = Code {
    code: "AUTH.PROVIDER_UNREACHABLE",
    http_status: 500,
    retry: RetryClass::Transient,
};

pub const SCHEMA_VALIDATION: Code = Code {
    code: "SCHEMA.VALIDATION",
    http_status: 400,
    retry: RetryClass::Permanent,
};

pub const LLM_PROVIDER_UNAVAILABLE: Code = Code {
    code: "LLM.PROVIDER_UNAVAILABLE",
    http_status: 500,
    retry: RetryClass::Transient,
};

pub const STORAGE_UNAVAILABLE: Code = Code {
    code: "STORAGE.UNAVAILABLE",
    http_status: 500,
    retry: RetryClass::Transient,
};

pub const UNKNOWN_INTERNAL: Code = Code {
    code: "UNKNOWN.INTERNAL",
    http_status: 500,
    retry: RetryClass::None,
};
