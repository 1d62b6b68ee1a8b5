mod cli;
mod config;
mod list_queries;
mod session_flow;
