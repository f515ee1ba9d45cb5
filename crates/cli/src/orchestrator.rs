//! Wires C1 through C10 together for the demo binary's three subcommands:
//! `check` (report which targets are stale), `build` (stale targets
//! through the worker pool, recording run info and reports), and `serve`
//! (browse a prior run's `info_dir`/`root` over HTTP).

use crate::config::OrchestratorConfig;
use crate::demo::{CompilerDriver, DemoTarget, EchoCompilerDriver};
use crate::error::{Error, Result};
use kiln_artifact_cache::{ArtifactCache, LocalArtifactCache};
use kiln_cache_manager::{CacheManager, InvalidationCheck, VersionedTargetSet};
use kiln_invalidator::BuildInvalidator;
use kiln_report::{ConsoleReporter, FileReporter, Reporter, RunTracker};
use kiln_scheduler::{Work, WorkerPool};
use kiln_task_graph::TargetGraph;
use std::path::PathBuf;
use std::sync::Arc;

fn open_invalidator(config: &OrchestratorConfig) -> Result<BuildInvalidator> {
    match &config.build_invalidator_dir {
        Some(dir) => Ok(BuildInvalidator::new(dir.clone())),
        None => Ok(BuildInvalidator::discover()?),
    }
}

fn build_graph(targets: &[String], root: &std::path::Path) -> Result<TargetGraph<DemoTarget>> {
    let mut graph = TargetGraph::new();
    for id in targets {
        let target = DemoTarget::load(id, root)?;
        graph.add_target(id, target)?;
    }
    graph.add_dependency_edges()?;
    Ok(graph)
}

fn files_under(dir: &std::path::Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// `check` subcommand: compute and log the invalidation status of every
/// requested target, without building anything.
///
/// # Errors
///
/// Returns an error if a target is missing, the graph has cycles, or the
/// invalidator store can't be read.
pub fn check(config: &OrchestratorConfig, targets: &[String]) -> Result<InvalidationCheck> {
    let invalidator = open_invalidator(config)?;
    let manager = CacheManager::new(invalidator, config.invalidate_dependents);
    let graph = build_graph(targets, &config.root)?;
    let outcome = manager.check(&graph, targets, config.partition_size_hint)?;

    for vts in &outcome.all {
        tracing::info!(
            targets = ?vts.target_ids(),
            valid = vts.valid,
            combined_key = %vts.combined_key.hash,
            "target set checked"
        );
    }
    Ok(outcome)
}

/// `build` subcommand: `check`, then compile every invalid
/// [`VersionedTargetSet`] through the worker pool, consulting the local
/// artifact cache first, and record the run via `kiln-report`.
///
/// # Errors
///
/// Returns an error if the graph can't be built, a compile step fails
/// (a non-zero exit from the driver is task-fatal), or the run tracker
/// can't be started.
pub async fn build(config: &OrchestratorConfig, targets: &[String]) -> Result<()> {
    let invalidator = open_invalidator(config)?;
    let manager = CacheManager::new(invalidator, config.invalidate_dependents);
    let graph = build_graph(targets, &config.root)?;
    let mut outcome = manager.check(&graph, targets, config.partition_size_hint)?;

    let cmd_line = format!("kiln build {}", targets.join(" "));
    let reporters: Vec<Box<dyn Reporter>> = vec![
        Box::new(ConsoleReporter),
        Box::new(FileReporter::new(config.info_dir.join("build.log"))),
    ];
    let tracker = RunTracker::new(&config.info_dir, cmd_line, reporters).await?;
    let pool = WorkerPool::new(config.num_workers, tracker.root_id());
    let artifact_cache = LocalArtifactCache::new(config.info_dir.join("artifacts"));
    let driver: Arc<dyn CompilerDriver> = Arc::new(EchoCompilerDriver);

    let mut build_failed = None;
    for vts in &mut outcome.invalid {
        match build_one_set(config, &pool, &artifact_cache, &driver, vts).await {
            Ok(()) => {
                if let Err(e) = manager.update(vts) {
                    build_failed = Some(e.into());
                    break;
                }
            }
            Err(e) => {
                build_failed = Some(e);
                break;
            }
        }
    }

    pool.shutdown().await;
    tracker.close().await;

    match build_failed {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Build every member of one [`VersionedTargetSet`]: a local-cache hit
/// skips the compile step entirely; a miss runs through the worker pool
/// and, on success, populates the local cache from the driver's output
/// directory.
async fn build_one_set(
    config: &OrchestratorConfig,
    pool: &Arc<WorkerPool>,
    artifact_cache: &LocalArtifactCache,
    driver: &Arc<dyn CompilerDriver>,
    vts: &VersionedTargetSet,
) -> Result<()> {
    let classes_root = config.info_dir.join("classes");
    let mut to_compile = Vec::new();

    for vt in &vts.vts {
        let classes_dir = classes_root.join(&vt.target_id);
        let key = vt.cache_key.hash.clone();
        if artifact_cache.use_cached_files(&key, &classes_dir).await {
            tracing::debug!(target = %vt.target_id, "served from local artifact cache");
            continue;
        }
        to_compile.push((vt.target_id.clone(), key, config.root.join(&vt.target_id), classes_dir));
    }

    if to_compile.is_empty() {
        return Ok(());
    }

    let driver = Arc::clone(driver);
    let work = Work::new(
        Arc::new(move |(target_id, key, source_dir, classes_dir): (String, String, PathBuf, PathBuf)| {
            let sources = files_under(&source_dir);
            let exit_code = driver.compile(&sources, &classes_dir);
            if exit_code == 0 {
                Ok((target_id, key, classes_dir))
            } else {
                Err(format!("compile of {target_id} failed with exit code {exit_code}").into())
            }
        }),
        to_compile,
    )
    .with_workunit_name("compile");

    let compiled = pool.submit_sync(work).await.map_err(|_| Error::CompileFailed {
        target: vts.target_ids().join(","),
        exit_code: 1,
    })?;

    for (target_id, key, classes_dir) in compiled {
        let outputs = files_under(&classes_dir);
        artifact_cache.insert(&key, &outputs).await;
        tracing::info!(target = %target_id, "compiled");
    }
    Ok(())
}

/// `serve` subcommand: serve `kiln-server`'s routes over `addr` until the
/// process receives Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener can't bind or the server loop fails.
pub async fn serve(config: &OrchestratorConfig, addr: std::net::SocketAddr) -> Result<()> {
    let settings = Arc::new(kiln_server::Settings {
        info_dir: config.info_dir.clone(),
        assets_dir: config.assets_dir.clone(),
        root: config.root.clone(),
        allowed_clients: config.allowed_clients.clone(),
    });

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::ServerIo)?;
    tracing::info!(%addr, "reporting server listening");
    kiln_server::serve(settings, listener, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
    .map_err(Error::ServerIo)
}
