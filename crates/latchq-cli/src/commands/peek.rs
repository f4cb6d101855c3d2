use latchq_node::{NodeContext, TensorHandle};
use latchq_store::{DiskStore, TripletQueue, sanitize_queue_name};
use serde_json::json;

pub fn run(
    queue: String,
    from: Option<usize>,
    max: usize,
    output_root: Option<String>,
    json_output: bool,
) {
    let config = super::load_config_or_exit();
    let root = config.resolve_output_root(output_root);
    let ctx = NodeContext::new(&root);

    let lines = match <DiskStore as TripletQueue<TensorHandle>>::list_unread(
        ctx.disk(),
        &queue,
        from,
        max,
    ) {
        Ok(lines) => lines,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let name = sanitize_queue_name(&queue);
    if json_output {
        let payload = json!({
            "action": "queue.peek",
            "queue": name,
            "outputRoot": root.display().to_string(),
            "count": lines.len(),
            "lines": lines,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("latchq peek\n  Queue: {name} (disk)\n  Root: {}", root.display());
        if lines.is_empty() {
            println!("  (no unread items)");
        }
        for line in lines {
            println!("  {line}");
        }
    }
}
