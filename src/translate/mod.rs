pub mod google;
pub mod history;
pub mod interface;

pub use google::GoogleTranslateClient;
pub use history::TranslationHistory;
pub use interface::{TranslateError, TranslateInterface, TranslateRequest};
