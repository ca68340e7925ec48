pub mod api;
pub mod config;
pub mod db;
pub mod http_server;
pub mod player_service;
pub mod referrals;
