/// Middleware modules for the API server
///
/// Session authentication and role guards live in `app` next to the router;
/// this module holds the transport-level layers.

pub mod security;
