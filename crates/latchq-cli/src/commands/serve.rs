use latchq_node::{PreviewServerConfig, serve_preview_api};

pub fn run(bind: Option<String>) {
    let config = super::load_config_or_exit();
    let bind = config.resolve_bind(bind);
    let addr = match bind.parse() {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("error: invalid bind address '{bind}': {err}");
            std::process::exit(1);
        }
    };

    println!("latchq preview api listening on {bind}");
    if let Err(err) = serve_preview_api(PreviewServerConfig { bind: addr }) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
