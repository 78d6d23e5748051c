//! Adapters at the edge of the workflow core: inbound rate limiting and webhook
//! verification, and outbound calls to the voice and LLM vendors.

pub mod rate_limit;
pub mod voice;
pub mod webhook;
pub mod will_extraction;

pub use rate_limit::{
    client_key, enforce_rate_limit, CounterStore, CounterStoreError, FixedWindowLimiter,
    InMemoryCounterStore, RateDecision, RateLimiter, SlidingWindowLimiter,
};
pub use voice::{PhoneCall, PhoneCallRequest, RetellClient, VoiceCallError};
pub use webhook::{
    require_signature, retell_webhook_router, CallDetails, CallEvent, CallEventSink,
    CallEventSinkError, SignatureError, SignatureVerifier, SIGNATURE_HEADER,
};
pub use will_extraction::{
    parse_will_extraction, ChatCompletion, EmptyFallback, ExtractionOutcome, LlmError,
    OpenAiCompatibleChat, WillExtraction, WillExtractor,
};
