use dotenvy::dotenv;
use log::info;
use plume_engine::{db_types::User, RpcArgs, RpcError, RpcReply};
use plume_server::{cli::handle_command_line_args, config::ServerConfig, server::RpcServer};
use serde_json::json;

async fn echo(args: RpcArgs, _user: Option<User>) -> Result<RpcReply, RpcError> {
    Ok(RpcReply::ok(json!({ "result": args })))
}

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return;
    }
    let config = ServerConfig::from_env_or_default();

    let mut server = RpcServer::new();
    if let Err(e) = server.add_rpc("echo", echo) {
        eprintln!("{e}");
        return;
    }
    info!("🚀️ Starting server on {}:{}", config.host, config.port);
    let running = match server.start(config).await {
        Ok(running) => running,
        Err(e) => {
            eprintln!("{e}");
            return;
        },
    };
    match running.wait().await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
