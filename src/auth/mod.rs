// Authentication: gateway identity resolution and audit logging

pub mod audit_logger;
pub mod auth_middleware;
pub mod gateway_key;
