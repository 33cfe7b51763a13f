// HTTP upload server
//
// One endpoint takes a multipart MIDI upload and answers with the bell
// sequence; extraction runs on the blocking pool.

mod routes;

pub use routes::{
    build_router, health, run_http_server, upload_midi, AppState, HealthResponse, HttpError, TrackSummary,
    UploadResponse, MIDI_FIELD,
};
