//! Select a protocol for a study and fill its viewports

use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use hanging_protocols::adapters::{DirectoryProtocolSource, DirectoryStudySource, InMemoryProtocolSource, load_study_file};
use hanging_protocols::config::GlobalConfig;
use hanging_protocols::core::models::{PriorStudy, StudySummary};
use hanging_protocols::core::ports::{ProtocolDataSource, StudyMetadataSource};
use hanging_protocols::core::services::ProtocolEngine;
use hanging_protocols::output::{MatchReport, OutputMode, RankedProtocol, ViewportReport};

use crate::cli::app::MatchArgs;

fn protocol_source(args: &MatchArgs, config: &GlobalConfig) -> anyhow::Result<Arc<dyn ProtocolDataSource>> {
    let explicit = args.protocols.is_some();
    let dir = args.protocols.clone().unwrap_or_else(|| config.protocols_dir());

    if !explicit && !dir.is_dir() {
        log::warn!("protocol library {} not found, using the built-in default only", dir.display());
        return Ok(Arc::new(InMemoryProtocolSource::default().with_default()));
    }

    let source = DirectoryProtocolSource::open(&dir)
        .with_context(|| format!("cannot load protocol library {}", dir.display()))?;
    let source = if config.library.builtin_default { source.with_default() } else { source };
    Ok(Arc::new(source))
}

fn priors(args: &MatchArgs, config: &GlobalConfig) -> anyhow::Result<Vec<PriorStudy>> {
    let mut priors = Vec::with_capacity(args.priors.len() + args.prior_uids.len());
    for path in &args.priors {
        let study = load_study_file(path).with_context(|| format!("cannot load prior {}", path.display()))?;
        priors.push(PriorStudy::from(study));
    }

    if !args.prior_uids.is_empty() {
        let dir = args.studies.clone().unwrap_or_else(|| config.studies_dir());
        let studies: Arc<dyn StudyMetadataSource> = Arc::new(DirectoryStudySource::new(dir));
        for uid in &args.prior_uids {
            priors.push(PriorStudy::from(StudySummary::new(uid.as_str()).with_source(Arc::clone(&studies))));
        }
    }
    Ok(priors)
}

/// Rank protocols for the study and report the best image per viewport
pub async fn match_study(args: &MatchArgs, config: &GlobalConfig, mode: OutputMode) -> anyhow::Result<()> {
    let study = load_study_file(&args.study).with_context(|| format!("cannot load study {}", args.study.display()))?;
    let priors = priors(args, config)?;
    let protocols = protocol_source(args, config)?;
    let default_id = args.default_protocol.clone().unwrap_or_else(|| config.library.default_protocol_id.clone());

    let engine = ProtocolEngine::new(Arc::new(study), priors, protocols)?.with_default_protocol_id(default_id);

    let matched = engine.get_matched_protocols().await?;
    let non_matched = engine.get_non_matched_protocols().await?;
    let best = engine.get_best_protocol_match().await?;
    let best_ranked = matched
        .iter()
        .find(|m| Arc::ptr_eq(&m.protocol, &best))
        .map_or_else(
            || RankedProtocol {
                id: best.id.clone(),
                name: best.name.clone(),
                score: 0,
            },
            RankedProtocol::from,
        );

    let stage = best.stages().first();
    let viewports = match stage.and_then(|s| s.main_screen()) {
        Some(screen) => {
            let results = join_all(screen.viewports.iter().map(|viewport| engine.match_images(viewport))).await;
            results
                .into_iter()
                .enumerate()
                .map(|(index, result)| match result {
                    Ok(matches) => ViewportReport::from_matches(index, &matches),
                    Err(err) => ViewportReport::failed(index, err),
                })
                .collect()
        },
        None => Vec::new(),
    };

    let report = MatchReport {
        study_instance_uid: engine.study().study_instance_uid().to_string(),
        prior_count: engine.priors().len(),
        best_protocol: best_ranked,
        matched: matched.iter().map(RankedProtocol::from).collect(),
        non_matched,
        stage: stage.and_then(|s| s.name.clone()),
        viewports,
    };
    report.render(mode, args.details || config.output.show_details);
    Ok(())
}
