use std::path::PathBuf;

use latchq_node::{NodeContext, PickRequest};
use serde_json::json;

use crate::cli::{KindArg, PolicyArg, SortArg};

#[derive(Debug)]
pub struct Args {
    pub root: String,
    pub kind: KindArg,
    pub index: i64,
    pub sort: SortArg,
    pub on_out_of_range: PolicyArg,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub extensions: Option<String>,
    pub max_list_items: usize,
    pub json: bool,
}

pub fn run(args: Args) {
    let config = super::load_config_or_exit();
    let ctx = NodeContext::new(config.resolve_output_root(None));
    let request = PickRequest {
        root_dir: PathBuf::from(&args.root),
        index: args.index,
        sort: args.sort.into(),
        on_out_of_range: args.on_out_of_range.into(),
        include: args.include,
        exclude: args.exclude,
        extensions: args.extensions,
        max_list_items: args.max_list_items,
    };

    let result = match args.kind {
        KindArg::Dirs => ctx.pick_subdirectory(&request),
        KindArg::Files => ctx.pick_file_by_index(&request),
    };
    let out = match result {
        Ok(out) => out,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if args.json {
        let payload = json!({
            "action": "pick.resolve",
            "root": args.root,
            "picked": {
                "path": out.pick.path.display().to_string(),
                "name": out.pick.name,
                "stem": out.pick.stem,
                "index": out.pick.index,
                "total": out.pick.total,
            },
            "lines": out.lines,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!(
            "latchq pick\n  Root: {}\n  Picked: [{}/{}] {}\n  Path: {}",
            args.root,
            out.pick.index,
            out.pick.total,
            out.pick.name,
            out.pick.path.display()
        );
        for line in out.lines {
            println!("  {line}");
        }
    }
}
