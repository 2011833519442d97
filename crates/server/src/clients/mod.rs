pub mod completion;

pub use completion::{CompletionHook, LogCompletion, WebhookCompletion};
