//! The seven pipeline phases.
//!
//! Each phase is a unit struct behind the `PipelinePhase` trait,
//! dispatched in order by the runner. A phase builds its iteration set
//! from what earlier phases persisted, attempts every item exactly once,
//! and reports per-item outcomes. Item failures are logged with the
//! offending identifier and position and never abort the phase; the only
//! fatal condition in the whole pipeline is an unresolvable root.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use transnet_common::{Account, Edge, EdgeKind, ScrapeConfig, Tag, TransnetError};

use super::filter::{filter_degree0, filter_degree1, FilterCandidate};
use super::stats::PhaseReport;
use crate::traits::{GraphStore, RemoteGraphSource};

/// Per-item fetches within one phase run concurrently up to this bound.
/// The remote API is rate limited; more workers just trade 429 retries
/// for throughput we cannot use.
pub const MAX_CONCURRENT_FETCHES: usize = 4;

/// Shared dependencies every phase executes against.
pub struct PhaseContext<'a> {
    pub store: &'a dyn GraphStore,
    pub source: &'a dyn RemoteGraphSource,
    pub config: &'a ScrapeConfig,
}

#[async_trait]
pub trait PipelinePhase: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &PhaseContext<'_>) -> Result<PhaseReport>;
}

/// The ordered phase list. `run(start_phase)` slices into this.
pub fn phases() -> Vec<Box<dyn PipelinePhase>> {
    vec![
        Box::new(RootFetch),
        Box::new(RootFollowerPull),
        Box::new(FilterPass0),
        Box::new(SampleGraphPull),
        Box::new(FilterPass1),
        Box::new(ExtendedGraphPull),
        Box::new(StatusPull),
    ]
}

// ---------------------------------------------------------------------------
// Phase 0: root fetch
// ---------------------------------------------------------------------------

pub struct RootFetch;

#[async_trait]
impl PipelinePhase for RootFetch {
    fn name(&self) -> &'static str {
        "root-fetch"
    }

    async fn execute(&self, ctx: &PhaseContext<'_>) -> Result<PhaseReport> {
        let screen_name = &ctx.config.root_user_screen_name;
        info!(screen_name = screen_name.as_str(), "Retrieving root account");

        let root = ctx
            .source
            .get_profile(screen_name)
            .await
            .map_err(|e| TransnetError::RootUnresolvable(format!("{screen_name}: {e}")))?;
        ctx.store.put_node(&root).await?;

        let mut report = PhaseReport::new(self.name());
        report.record(true);
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Phase 1: root follower pull
// ---------------------------------------------------------------------------

pub struct RootFollowerPull;

#[async_trait]
impl PipelinePhase for RootFollowerPull {
    fn name(&self) -> &'static str {
        "root-follower-pull"
    }

    async fn execute(&self, ctx: &PhaseContext<'_>) -> Result<PhaseReport> {
        let root = require_root(ctx).await?;
        let limit = ctx.config.root_user_follower_limit;
        info!(
            screen_name = root.screen_name.as_str(),
            limit, "Retrieving root followers"
        );

        let mut report = PhaseReport::new(self.name());
        match ctx.source.get_follow_edges(&root, limit).await {
            Ok(followers) => {
                let total = followers.len();
                for (index, follower) in followers.iter().enumerate() {
                    info!(
                        index,
                        total,
                        screen_name = follower.screen_name.as_str(),
                        "Persisting follower"
                    );
                    let edge = Edge {
                        source_id: follower.id,
                        target_id: root.id,
                        kind: EdgeKind::Follows,
                    };
                    report.record(persist_neighbor(ctx.store, follower, edge).await);
                }
            }
            Err(e) => {
                warn!(
                    screen_name = root.screen_name.as_str(),
                    error = %e,
                    "Follower pull failed"
                );
                report.record(false);
            }
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Phase 2: degree-0 filter pass
// ---------------------------------------------------------------------------

pub struct FilterPass0;

#[async_trait]
impl PipelinePhase for FilterPass0 {
    fn name(&self) -> &'static str {
        "filter-pass-0"
    }

    async fn execute(&self, ctx: &PhaseContext<'_>) -> Result<PhaseReport> {
        let root = require_root(ctx).await?;
        info!(
            screen_name = root.screen_name.as_str(),
            target = ctx.config.target_location.as_str(),
            "Filtering root follower graph"
        );

        // The root and its followers are all candidates; each is judged
        // by its own persisted followers.
        let mut accounts = vec![root.clone()];
        accounts.extend(ctx.store.followers_of(root.id).await?);

        let mut report = PhaseReport::new(self.name());
        let candidates =
            collect_candidates(ctx.store, &accounts, Neighborhood::Followers, &mut report).await;
        let qualifying = filter_degree0(
            &candidates,
            &ctx.config.target_location,
            ctx.config.min_match_ratio,
        );
        apply_tags(ctx.store, Tag::Filter0, &candidates, &qualifying, &mut report).await;

        info!(tagged = report.tagged, "Degree-0 filtering complete");
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Phase 3: sample-graph pull
// ---------------------------------------------------------------------------

pub struct SampleGraphPull;

#[async_trait]
impl PipelinePhase for SampleGraphPull {
    fn name(&self) -> &'static str {
        "sample-graph-pull"
    }

    async fn execute(&self, ctx: &PhaseContext<'_>) -> Result<PhaseReport> {
        let members = ctx.store.tag_members(Tag::Filter0).await?;
        let total = members.len();
        let limit = ctx.config.filter_graph_sample_limit;
        info!(total, limit, "Retrieving sample graphs for FILTER_0 accounts");

        let mut futures = Vec::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            futures.push(async move {
                info!(
                    index,
                    total,
                    screen_name = member.screen_name.as_str(),
                    "Retrieving sample graph"
                );
                pull_friends(ctx, member, limit).await
            });
        }
        let outcomes: Vec<bool> = stream::iter(futures)
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        let mut report = PhaseReport::new(self.name());
        for ok in outcomes {
            report.record(ok);
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Phase 4: degree-1 filter pass
// ---------------------------------------------------------------------------

pub struct FilterPass1;

#[async_trait]
impl PipelinePhase for FilterPass1 {
    fn name(&self) -> &'static str {
        "filter-pass-1"
    }

    async fn execute(&self, ctx: &PhaseContext<'_>) -> Result<PhaseReport> {
        let members = ctx.store.tag_members(Tag::Filter0).await?;
        info!(total = members.len(), "Transnational graph filtering");

        let mut report = PhaseReport::new(self.name());
        let candidates =
            collect_candidates(ctx.store, &members, Neighborhood::Friends, &mut report).await;
        let qualifying = filter_degree1(&candidates);
        apply_tags(ctx.store, Tag::Filter1, &candidates, &qualifying, &mut report).await;

        info!(tagged = report.tagged, "Degree-1 filtering complete");
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Phase 5: extended-graph pull
// ---------------------------------------------------------------------------

pub struct ExtendedGraphPull;

#[async_trait]
impl PipelinePhase for ExtendedGraphPull {
    fn name(&self) -> &'static str {
        "extended-graph-pull"
    }

    async fn execute(&self, ctx: &PhaseContext<'_>) -> Result<PhaseReport> {
        let members = ctx.store.tag_members(Tag::Filter1).await?;
        let total = members.len();
        let limit = ctx.config.extended_graph_limit;
        info!(total, limit, "Retrieving extended graphs for FILTER_1 accounts");

        let mut futures = Vec::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            futures.push(async move {
                info!(
                    index,
                    total,
                    screen_name = member.screen_name.as_str(),
                    "Retrieving extended graph"
                );
                let friends_ok = pull_friends(ctx, member, limit).await;
                let followers_ok = pull_followers(ctx, member, limit).await;
                friends_ok && followers_ok
            });
        }
        let outcomes: Vec<bool> = stream::iter(futures)
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        let mut report = PhaseReport::new(self.name());
        for ok in outcomes {
            report.record(ok);
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Phase 6: status pull
// ---------------------------------------------------------------------------

pub struct StatusPull;

#[async_trait]
impl PipelinePhase for StatusPull {
    fn name(&self) -> &'static str {
        "status-pull"
    }

    async fn execute(&self, ctx: &PhaseContext<'_>) -> Result<PhaseReport> {
        let members = ctx.store.tag_members(Tag::Filter1).await?;
        let mut report = PhaseReport::new(self.name());

        for member in &members {
            info!(
                screen_name = member.screen_name.as_str(),
                "Retrieving statuses for account graph"
            );

            // Friends and followers persisted by the extended pull; an
            // account can be both, so fetch its timeline once.
            let neighborhood = match neighborhood_of(ctx.store, member).await {
                Ok(accounts) => accounts,
                Err(e) => {
                    warn!(
                        screen_name = member.screen_name.as_str(),
                        error = %e,
                        "Failed to load persisted graph"
                    );
                    report.record(false);
                    continue;
                }
            };

            let total = neighborhood.len();
            let mut futures = Vec::with_capacity(neighborhood.len());
            for (index, neighbor) in neighborhood.iter().enumerate() {
                futures.push(async move {
                    info!(
                        index,
                        total,
                        screen_name = neighbor.screen_name.as_str(),
                        "Retrieving statuses"
                    );
                    pull_statuses(ctx, neighbor).await
                });
            }
            let outcomes: Vec<bool> = stream::iter(futures)
                .buffer_unordered(MAX_CONCURRENT_FETCHES)
                .collect()
                .await;

            for ok in outcomes {
                report.record(ok);
            }
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load the root account persisted by the root-fetch phase. Resumed runs
/// land here without a phase-0 in this process, so the store is the only
/// source of truth for the root.
async fn require_root(ctx: &PhaseContext<'_>) -> Result<Account> {
    let screen_name = &ctx.config.root_user_screen_name;
    ctx.store
        .node_by_screen_name(screen_name)
        .await?
        .ok_or_else(|| {
            TransnetError::RootUnresolvable(format!(
                "{screen_name} is not persisted; run the root-fetch phase first"
            ))
            .into()
        })
}

/// Persist a discovered account and its edge. Both writes are idempotent;
/// a failure of either counts the whole item as failed.
async fn persist_neighbor(store: &dyn GraphStore, account: &Account, edge: Edge) -> bool {
    let result = async {
        store.put_node(account).await?;
        store.put_edge(&edge).await
    }
    .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(id = account.id, error = %e, "Failed to persist account");
            false
        }
    }
}

async fn pull_friends(ctx: &PhaseContext<'_>, member: &Account, limit: u32) -> bool {
    match ctx.source.get_friend_edges(member, limit).await {
        Ok(friends) => {
            let mut ok = true;
            for friend in &friends {
                let edge = Edge {
                    source_id: member.id,
                    target_id: friend.id,
                    kind: EdgeKind::Friend,
                };
                ok &= persist_neighbor(ctx.store, friend, edge).await;
            }
            ok
        }
        Err(e) => {
            warn!(
                screen_name = member.screen_name.as_str(),
                error = %e,
                "Friend pull failed"
            );
            false
        }
    }
}

async fn pull_followers(ctx: &PhaseContext<'_>, member: &Account, limit: u32) -> bool {
    match ctx.source.get_follow_edges(member, limit).await {
        Ok(followers) => {
            let mut ok = true;
            for follower in &followers {
                let edge = Edge {
                    source_id: follower.id,
                    target_id: member.id,
                    kind: EdgeKind::Follows,
                };
                ok &= persist_neighbor(ctx.store, follower, edge).await;
            }
            ok
        }
        Err(e) => {
            warn!(
                screen_name = member.screen_name.as_str(),
                error = %e,
                "Follower pull failed"
            );
            false
        }
    }
}

async fn pull_statuses(ctx: &PhaseContext<'_>, account: &Account) -> bool {
    match ctx.source.get_recent_messages(account).await {
        Ok(statuses) => {
            let mut ok = true;
            for status in &statuses {
                if let Err(e) = ctx.store.put_status(status).await {
                    warn!(id = status.id, error = %e, "Failed to persist status");
                    ok = false;
                }
            }
            ok
        }
        Err(e) => {
            warn!(
                screen_name = account.screen_name.as_str(),
                error = %e,
                "Status pull failed"
            );
            false
        }
    }
}

/// Persisted friends and followers of an account, deduplicated by id.
async fn neighborhood_of(store: &dyn GraphStore, member: &Account) -> Result<Vec<Account>> {
    let mut accounts = store.friends_of(member.id).await?;
    accounts.extend(store.followers_of(member.id).await?);

    let mut seen = std::collections::HashSet::new();
    accounts.retain(|a| seen.insert(a.id));
    Ok(accounts)
}

enum Neighborhood {
    Followers,
    Friends,
}

/// Reduce each account to a filter candidate by reading its persisted
/// neighborhood. Accounts whose neighborhood cannot be read are counted
/// as failed items and excluded from this pass; re-running the phase
/// picks them up again (tagging is monotonic, so that is safe).
async fn collect_candidates(
    store: &dyn GraphStore,
    accounts: &[Account],
    neighborhood: Neighborhood,
    report: &mut PhaseReport,
) -> Vec<FilterCandidate> {
    let mut candidates = Vec::with_capacity(accounts.len());
    for account in accounts {
        let neighbors = match neighborhood {
            Neighborhood::Followers => store.followers_of(account.id).await,
            Neighborhood::Friends => store.friends_of(account.id).await,
        };
        match neighbors {
            Ok(neighbors) => candidates.push(FilterCandidate {
                id: account.id,
                neighbor_locations: neighbors.into_iter().map(|n| n.location).collect(),
            }),
            Err(e) => {
                warn!(id = account.id, error = %e, "Failed to read neighborhood");
                report.record(false);
            }
        }
    }
    candidates
}

/// Tag the qualifying candidates. Non-qualifying candidates still count
/// as completed items — evaluating them is the phase's work.
async fn apply_tags(
    store: &dyn GraphStore,
    tag: Tag,
    candidates: &[FilterCandidate],
    qualifying: &std::collections::BTreeSet<i64>,
    report: &mut PhaseReport,
) {
    for candidate in candidates {
        if !qualifying.contains(&candidate.id) {
            report.record(true);
            continue;
        }
        match store.tag_add(tag, candidate.id).await {
            Ok(()) => {
                report.tagged += 1;
                report.record(true);
            }
            Err(e) => {
                warn!(id = candidate.id, tag = %tag, error = %e, "Failed to tag account");
                report.record(false);
            }
        }
    }
}
