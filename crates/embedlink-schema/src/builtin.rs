//! Schemas shipped with the crate, one per envelope type.

/// Envelopes of the current protocol.
pub const V1: &[(&str, &str)] = &[
    ("STORE_PATH_CHANGED", include_str!("schemas/store_path_changed.schema.json")),
    ("CALLBACK", include_str!("schemas/callback.schema.json")),
    ("SET_INSTALLED", include_str!("schemas/set_installed.schema.json")),
    ("UNSAFE_PARAMS_CHANGE", include_str!("schemas/unsafe_params_change.schema.json")),
    ("SESSION_RELOAD", include_str!("schemas/session_reload.schema.json")),
];

/// Envelopes of the legacy protocol. Only path and callback differ from [`V1`].
pub const LEGACY: &[(&str, &str)] = &[
    ("STORE_PATH_CHANGE", include_str!("schemas/legacy/store_path_change.schema.json")),
    ("CALLBACK", include_str!("schemas/legacy/callback.schema.json")),
    ("SET_INSTALLED", include_str!("schemas/set_installed.schema.json")),
    ("UNSAFE_PARAMS_CHANGE", include_str!("schemas/unsafe_params_change.schema.json")),
    ("SESSION_RELOAD", include_str!("schemas/session_reload.schema.json")),
];
