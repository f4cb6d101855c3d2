use latchq_node::{NodeContext, StatusRequest, StorageBackend};
use latchq_store::sanitize_queue_name;
use serde_json::json;

pub fn run(queue: String, output_root: Option<String>, json_output: bool) {
    let config = super::load_config_or_exit();
    let root = config.resolve_output_root(output_root);
    let ctx = NodeContext::new(&root);

    let out = match ctx.queue_status(StatusRequest {
        storage: StorageBackend::Disk,
        queue_name: queue.clone(),
        reset_cursor: false,
        max_list_items: 0,
    }) {
        Ok(out) => out,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let name = sanitize_queue_name(&queue);
    if json_output {
        let payload = json!({
            "action": "queue.status",
            "queue": name,
            "outputRoot": root.display().to_string(),
            "total": out.status.total,
            "cursor": out.status.cursor,
            "unread": out.status.unread,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!(
            "latchq status\n  Queue: {name} (disk)\n  Root: {}\n  Total: {}  Cursor: {}  Unread: {}",
            root.display(),
            out.status.total,
            out.status.cursor,
            out.status.unread
        );
    }
}
