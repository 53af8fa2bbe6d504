use anyhow::Result;
use codemap_graph::{FileContext, ProjectGraph};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

pub fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn graph(graph: &ProjectGraph, json: bool) -> Result<()> {
    if json {
        return print_json(graph);
    }

    let stats = &graph.stats;
    println!("Project:    {} ({})", graph.project_name, graph.branch);
    println!("Graph id:   {}", graph.project_id);
    if stats.languages.is_empty() {
        println!("Files:      {}", stats.total_files);
    } else {
        println!("Files:      {} ({})", stats.total_files, stats.languages.join(", "));
    }
    println!("Edges:      {}", stats.total_edges);
    println!(
        "Symbols:    {} functions, {} classes, {} exports",
        stats.total_functions, stats.total_classes, stats.total_exports
    );
    println!(
        "Complexity: {:.2} average, {} max dependents",
        stats.average_complexity, stats.max_dependents
    );
    println!(
        "Build:      {} chunks in {}ms",
        stats.chunk_count, stats.processing_time_ms
    );
    Ok(())
}

pub fn file_context(context: &FileContext, json: bool) -> Result<()> {
    if json {
        return print_json(context);
    }
    print!("{}", context.summary);
    Ok(())
}

pub fn diagram(text: &str, json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::json!({ "diagram": text }));
    }
    print!("{text}");
    Ok(())
}

pub fn swept(removed: usize, json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::json!({ "removed": removed }));
    }
    println!("Removed {removed} expired graphs");
    Ok(())
}
