use embedlink_session::{
    AcceptableParameters, AuthStyle, CreateSession, SessionClient, SessionClientConfig,
    SessionRequest, UpdateMethod,
};
use serde::Serialize;
use serde_json::Value;

use crate::cmd::{
    parse_nonzero_duration, SessionApiArgs, SessionCommand, SessionCreateArgs,
    SessionRevokeArgs, SessionUpdateArgs, SCHEMA_BASE,
};
use crate::exit::{io_error, session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{emit, value_preview, OutputFormat};

#[derive(Serialize)]
struct SessionOutput {
    schema_id: String,
    operation: &'static str,
    method: String,
    url: String,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    /// Request body on a dry run, response body otherwise.
    body: Value,
}

pub fn run(command: SessionCommand, format: OutputFormat) -> CliResult<i32> {
    match command {
        SessionCommand::Create(args) => create(args, format),
        SessionCommand::Update(args) => update(args, format),
        SessionCommand::Revoke(args) => revoke(args, format),
    }
}

fn create(args: SessionCreateArgs, format: OutputFormat) -> CliResult<i32> {
    let request = CreateSession {
        store_id: args.store_id,
        domain: args.domain,
        data: parse_data(&args.data)?,
    };
    let client = build_client(&args.api, UpdateMethod::default())?;
    let planned = client
        .plan_create(&request)
        .map_err(|err| session_error("session create failed", err))?;
    if args.api.dry_run {
        return print_plan("create", planned, format);
    }

    let response = block_on(client.create(&request))?
        .map_err(|err| session_error("session create failed", err))?;
    print_response("create", planned, response.status, response.body, format)
}

fn update(args: SessionUpdateArgs, format: OutputFormat) -> CliResult<i32> {
    let data = parse_data(&args.data)?;
    let method = if args.put {
        UpdateMethod::Put
    } else {
        UpdateMethod::Patch
    };
    let client = build_client(&args.api, method)?;
    let planned = client
        .plan_update(&args.session_id, &data)
        .map_err(|err| session_error("session update failed", err))?;
    if args.api.dry_run {
        return print_plan("update", planned, format);
    }

    let response = block_on(client.update(&args.session_id, &data))?
        .map_err(|err| session_error("session update failed", err))?;
    print_response("update", planned, response.status, response.body, format)
}

fn revoke(args: SessionRevokeArgs, format: OutputFormat) -> CliResult<i32> {
    let client = build_client(&args.api, UpdateMethod::default())?;
    let planned = client
        .plan_revoke(&args.session_id)
        .map_err(|err| session_error("session revoke failed", err))?;
    if args.api.dry_run {
        return print_plan("revoke", planned, format);
    }

    let response = block_on(client.revoke(&args.session_id))?
        .map_err(|err| session_error("session revoke failed", err))?;
    print_response("revoke", planned, response.status, response.body, format)
}

fn build_client(api: &SessionApiArgs, update_method: UpdateMethod) -> CliResult<SessionClient> {
    let config = SessionClientConfig {
        base_url: api.api_url.clone(),
        resource_path: api.resource_path.clone(),
        auth: match &api.auth_header {
            Some(name) => AuthStyle::Header(name.clone()),
            None => AuthStyle::Bearer,
        },
        update_method,
        timeout: parse_nonzero_duration(&api.timeout)?,
    };
    SessionClient::new(api.api_key.as_str(), config)
        .map_err(|err| session_error("session client setup failed", err))
}

fn parse_data(input: &str) -> CliResult<AcceptableParameters> {
    serde_json::from_str(input)
        .map_err(|err| CliError::new(USAGE, format!("--data is not valid session data: {err}")))
}

/// Run one request on a private current-thread runtime.
fn block_on<F: std::future::Future>(future: F) -> CliResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start async runtime", err))?;
    Ok(runtime.block_on(future))
}

fn print_plan(operation: &'static str, planned: SessionRequest, format: OutputFormat) -> CliResult<i32> {
    let output = SessionOutput {
        schema_id: format!("{SCHEMA_BASE}/session-request.schema.json"),
        operation,
        method: planned.method.to_string(),
        url: planned.url,
        dry_run: true,
        status: None,
        body: planned.body,
    };
    print_output(&output, format)?;
    Ok(SUCCESS)
}

fn print_response(
    operation: &'static str,
    planned: SessionRequest,
    status: u16,
    body: Value,
    format: OutputFormat,
) -> CliResult<i32> {
    tracing::info!(operation, status, "session api call succeeded");
    let output = SessionOutput {
        schema_id: format!("{SCHEMA_BASE}/session-response.schema.json"),
        operation,
        method: planned.method.to_string(),
        url: planned.url,
        dry_run: false,
        status: Some(status),
        body,
    };
    print_output(&output, format)?;
    Ok(SUCCESS)
}

fn print_output(output: &SessionOutput, format: OutputFormat) -> CliResult<()> {
    let mut rows = vec![
        ("operation", output.operation.to_string()),
        ("method", output.method.clone()),
        ("url", output.url.clone()),
    ];
    if let Some(status) = output.status {
        rows.push(("status", status.to_string()));
    }
    rows.push(("body", value_preview(&output.body)));
    let raw = value_preview(&output.body);
    emit(output, &rows, &raw, format)
}
