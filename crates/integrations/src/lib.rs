//! # ContentForge Integrations
//!
//! HTTP clients for the external providers ContentForge talks to:
//!
//! - **M-Pesa** (Safaricom Daraja): STK push and status query
//! - **Pesapal** v3: hosted card/mobile checkout, IPN, refunds
//! - **Claude**: content generation and transcript insights
//! - **Deepgram**: transcription with diarization
//! - **ImageKit**: media storage and signed browser uploads
//!
//! Each client sits behind a trait so the API layer can be tested with
//! mocks (enable the `mocks` feature).

pub mod anthropic;
pub mod deepgram;
pub mod error;
mod http;
pub mod imagekit;
pub mod mpesa;
pub mod pesapal;
pub mod token;

pub use anthropic::{ClaudeClient, ContentGenerator, GenerationRequest, generate_multiple};
pub use deepgram::{DeepgramClient, Transcriber};
pub use error::{IntegrationError, IntegrationResult};
pub use imagekit::{
    AuthenticationParameters, ImageKitClient, ImageKitFile, ListFilesOptions, MediaStorage,
    UploadRequest,
};
pub use mpesa::{MpesaClient, MpesaGateway, StkPushRequest};
pub use pesapal::{
    IpnNotificationType, PesapalClient, PesapalCustomer, PesapalGateway, PesapalOrder,
    PesapalPaymentResponse, RefundRequest, RefundResponse,
};

#[cfg(feature = "mocks")]
pub use anthropic::MockContentGenerator;
#[cfg(feature = "mocks")]
pub use deepgram::MockTranscriber;
#[cfg(feature = "mocks")]
pub use imagekit::MockMediaStorage;
#[cfg(feature = "mocks")]
pub use mpesa::MockMpesaGateway;
#[cfg(feature = "mocks")]
pub use pesapal::MockPesapalGateway;
