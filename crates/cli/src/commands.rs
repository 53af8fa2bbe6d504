use crate::output;
use anyhow::{anyhow, Context as _, Result};
use codemap_analyzer::{
    derive_persistent_project_id, AnalyzeRequest, CodemapConfig, GraphService, ServiceConfig,
    SourceLoader,
};
use codemap_graph::{BuildProgress, DiagramFormat, DiagramKind, DiagramOptions, ProjectGraph};
use codemap_store::{spawn_sweeper, GraphStore, JsonFileGraphStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Everything a subcommand needs, resolved once from the global flags
pub struct Context {
    root: PathBuf,
    config: CodemapConfig,
    store: Arc<dyn GraphStore>,
    user: String,
    json: bool,
}

impl Context {
    pub fn open(root: &Path, config_path: Option<&Path>, user: String, json: bool) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("project root {} not found", root.display()))?;
        let config = match config_path {
            Some(path) => CodemapConfig::load(path)?,
            None => CodemapConfig::load_from_root(&root)?,
        };
        let store_dir = config.store_dir(&root);
        log::debug!("Using graph store at {}", store_dir.display());

        Ok(Self {
            store: Arc::new(JsonFileGraphStore::new(store_dir)),
            root,
            config,
            user,
            json,
        })
    }

    fn service(&self) -> GraphService {
        GraphService::new(self.store.clone(), ServiceConfig::from(&self.config))
    }

    fn loader(&self) -> Result<SourceLoader> {
        Ok(SourceLoader::new(&self.root, &self.config.scan)?)
    }

    fn persistent_id(&self) -> String {
        derive_persistent_project_id(&self.user, &self.root.to_string_lossy())
    }

    async fn require_graph(&self, project_id: &str) -> Result<ProjectGraph> {
        self.service()
            .get_graph(project_id, &self.user)
            .await?
            .ok_or_else(|| missing(project_id))
    }
}

fn missing(project_id: &str) -> anyhow::Error {
    anyhow!("graph {project_id} not found or expired")
}

pub async fn analyze(
    ctx: Context,
    name: Option<String>,
    branch: Option<String>,
    chunk_size: Option<usize>,
    show_progress: bool,
) -> Result<()> {
    let files = ctx.loader()?.load().await?;
    log::info!("Analysing {} files under {}", files.len(), ctx.root.display());

    let mut config = ServiceConfig::from(&ctx.config);
    if let Some(chunk_size) = chunk_size {
        config.chunk_size = chunk_size;
    }

    let name = name.unwrap_or_else(|| directory_name(&ctx.root));
    let branch = branch
        .or_else(|| detect_branch(&ctx.root))
        .unwrap_or_else(|| "main".to_string());
    let request = AnalyzeRequest::new(ctx.user.clone(), name, branch)
        .with_persistent_id(ctx.persistent_id());

    let mut service = GraphService::new(ctx.store.clone(), config);
    let bar = (show_progress && !ctx.json).then(|| output::progress_bar(files.len() as u64));
    if let Some(bar) = &bar {
        let bar = bar.clone();
        service = service.with_progress(Arc::new(move |progress: &BuildProgress| {
            bar.set_position(progress.files_processed as u64);
        }));
    }

    let graph = service.analyze(&request, &files).await?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    output::graph(&graph, ctx.json)
}

pub async fn show(ctx: &Context, project_id: &str) -> Result<()> {
    let graph = ctx.require_graph(project_id).await?;
    output::graph(&graph, ctx.json)
}

pub async fn latest(ctx: &Context) -> Result<()> {
    let graph = ctx
        .service()
        .get_graph_for_project(&ctx.persistent_id(), &ctx.user)
        .await?
        .ok_or_else(|| anyhow!("no unexpired graph for {}", ctx.root.display()))?;
    output::graph(&graph, ctx.json)
}

pub async fn context(ctx: &Context, project_id: &str, file: &str) -> Result<()> {
    let service = ctx.service();
    if service.get_graph(project_id, &ctx.user).await?.is_none() {
        return Err(missing(project_id));
    }
    let context = service
        .get_file_context(project_id, file, &ctx.user)
        .await?
        .ok_or_else(|| anyhow!("{file} is not part of graph {project_id}"))?;
    output::file_context(&context, ctx.json)
}

pub async fn diagram(
    ctx: &Context,
    project_id: &str,
    kind: DiagramKind,
    focus_file: Option<String>,
    max_nodes: Option<usize>,
    format: DiagramFormat,
) -> Result<()> {
    let options = DiagramOptions {
        kind,
        focus_file,
        max_nodes: max_nodes.unwrap_or(ctx.config.diagram.max_nodes),
        format,
    };
    let text = ctx
        .service()
        .generate_diagram(project_id, &ctx.user, &options)
        .await?
        .ok_or_else(|| missing(project_id))?;
    output::diagram(&text, ctx.json)
}

pub async fn refresh(ctx: &Context, project_id: &str, paths: &[String]) -> Result<()> {
    let changes = ctx.loader()?.changes_for(paths)?;
    let graph = ctx
        .service()
        .refresh(project_id, &ctx.user, &changes)
        .await?
        .ok_or_else(|| missing(project_id))?;
    output::graph(&graph, ctx.json)
}

pub async fn rebuild(ctx: &Context, project_id: &str) -> Result<()> {
    let files = ctx.loader()?.load().await?;
    let graph = ctx
        .service()
        .rebuild(project_id, &ctx.user, &files)
        .await?
        .ok_or_else(|| missing(project_id))?;
    output::graph(&graph, ctx.json)
}

pub async fn sweep(ctx: &Context, every: Option<Duration>) -> Result<()> {
    let removed = ctx.service().sweep_expired().await?;
    output::swept(removed, ctx.json)?;

    let Some(period) = every else {
        return Ok(());
    };
    log::info!("Sweeping every {}s until interrupted", period.as_secs());
    let sweeper = spawn_sweeper(ctx.store.clone(), period);
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    sweeper.abort();
    Ok(())
}

fn directory_name(root: &Path) -> String {
    root.file_name()
        .map_or_else(|| "project".to_string(), |n| n.to_string_lossy().into_owned())
}

/// Branch checked out in `<root>/.git`, if any
fn detect_branch(root: &Path) -> Option<String> {
    let head = std::fs::read_to_string(root.join(".git").join("HEAD")).ok()?;
    head.trim()
        .strip_prefix("ref: refs/heads/")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_comes_from_git_head() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(detect_branch(dir.path()), None);

        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/feature/x\n").unwrap();
        assert_eq!(detect_branch(dir.path()), Some("feature/x".to_string()));

        std::fs::write(dir.path().join(".git/HEAD"), "3f2a9c0d\n").unwrap();
        assert_eq!(detect_branch(dir.path()), None);
    }
}
