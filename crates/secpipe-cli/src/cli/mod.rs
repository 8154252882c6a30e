pub mod companies;
pub mod documents;
pub mod filings;
pub mod financials;
pub mod jobs;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod worker;
