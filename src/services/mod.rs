pub mod book;
pub mod epub;
pub mod llm;
pub mod outline;
pub mod prompts;
pub mod storage;
