use gist_inference::Summarizer;

pub struct AppState {
    pub summarizer: Summarizer,
}

impl AppState {
    pub fn new(summarizer: Summarizer) -> Self {
        Self { summarizer }
    }
}
