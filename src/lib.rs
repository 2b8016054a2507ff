pub mod audio;
pub mod cli;
pub mod pyannote;
mod segments;
mod server;

pub use segments::{build_response, DiarizeResponse, SegmentResponse, SpeakerEntry};
pub use server::{create_router, AppState, HealthResponse, Server, SERVICE_NAME};
