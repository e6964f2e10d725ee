//! product-design: multi-agent product innovation analysis
//!
//! Three agents (market intelligence, technology, feasibility) analyse one
//! innovation topic in a fixed order. This library provides:
//! - An OpenAI chat-completions client with retries
//! - A Serper web search tool exposed to the agents
//! - The sequential crew runner with progress events
//! - Training, replay and evaluation of crew runs
//! - A web form with a server-sent progress stream

pub mod agent;
pub mod config;
pub mod crew;
pub mod evaluation;
pub mod llm;
pub mod report;
pub mod storage;
pub mod tools;
pub mod training;
pub mod transport;

pub use config::{Config, Credentials};
pub use crew::{Crew, CrewError, CrewEvent, CrewOutput, EventCallback, TaskKind, Topic};
pub use report::AnalysisReport;
