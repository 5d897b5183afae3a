//! Per-instance state of the county choropleth.
//!
//! A [`MapView`] is created by whatever hosts the map, mounted once, and fed
//! the results of the boundary and performance fetches as they complete, in
//! either order. Every fetch is tied to a [`FetchTicket`]; completions for a
//! superseded ticket or an unmounted view are rejected so late responses
//! never touch visible state.

use std::sync::Arc;

use serde::Serialize;

use crate::county::BoundaryCollection;
use crate::interaction::{HoverState, Interaction, PointerEvent, PointerPosition};
use crate::performance::{PerformanceLookup, ResolvedPerformance, Sector};
use crate::projection::ViewBox;
use crate::ranking::county_slug;
use crate::tier::{NO_DATA_COLOR, PerformanceTier};

pub const LOADING_MESSAGE: &str = "Loading map...";
pub const BOUNDARY_ERROR_MESSAGE: &str = "Failed to load map data";

/// Tooltip offset from the pointer, in screen pixels.
const TOOLTIP_OFFSET_X: f64 = 10.0;
const TOOLTIP_OFFSET_Y: f64 = -40.0;

#[derive(Debug, Clone, Default)]
pub enum BoundaryStatus {
    #[default]
    Loading,
    Ready(Arc<BoundaryCollection>),
    Failed(String),
}

impl BoundaryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BoundaryStatus::Loading => "loading",
            BoundaryStatus::Ready(_) => "ready",
            BoundaryStatus::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapOptions {
    pub sector: Sector,
    pub year: Option<i32>,
    /// County to emphasise; compared case-insensitively against boundary names.
    pub highlight: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus<'a> {
    Loading,
    Failed(&'a str),
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountySummary {
    pub object_id: i64,
    pub name: String,
    pub slug: String,
    pub color: &'static str,
    pub tier: Option<PerformanceTier>,
    pub score: Option<f64>,
    pub rank: Option<u32>,
    pub highlighted: bool,
    pub dimmed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub county: String,
    pub score: Option<f64>,
    pub rank: Option<u32>,
    pub left: f64,
    pub top: f64,
}

impl Tooltip {
    pub fn detail(&self) -> Option<String> {
        let score = self.score?;
        Some(match self.rank {
            Some(rank) => format!("Score: {score:.1} | Rank: #{rank}"),
            None => format!("Score: {score:.1}"),
        })
    }
}

pub type SelectionCallback = Box<dyn FnMut(&str) + Send>;

pub struct MapView {
    options: MapOptions,
    mounted: bool,
    next_ticket: u64,
    boundary_ticket: Option<u64>,
    performance_ticket: Option<u64>,
    pub(crate) boundaries: BoundaryStatus,
    pub(crate) performance: PerformanceLookup,
    performance_year: Option<i32>,
    performance_pending: bool,
    pub(crate) interaction: Interaction,
    on_select: Option<SelectionCallback>,
}

impl MapView {
    pub fn new(options: MapOptions) -> Self {
        Self {
            options,
            mounted: false,
            next_ticket: 0,
            boundary_ticket: None,
            performance_ticket: None,
            boundaries: BoundaryStatus::Loading,
            performance: PerformanceLookup::new(),
            performance_year: None,
            performance_pending: true,
            interaction: Interaction::default(),
            on_select: None,
        }
    }

    pub fn on_select(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_select = Some(Box::new(callback));
        self
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Start both loads. Returns `(boundary, performance)` tickets.
    pub fn mount(&mut self) -> (FetchTicket, FetchTicket) {
        self.mounted = true;
        self.boundaries = BoundaryStatus::Loading;
        self.performance_pending = true;
        let boundary = self.issue_ticket();
        let performance = self.issue_ticket();
        self.boundary_ticket = Some(boundary);
        self.performance_ticket = Some(performance);
        (FetchTicket(boundary), FetchTicket(performance))
    }

    /// Switch sector/year. The previous performance fetch becomes stale; the
    /// current colors stay up until the new rows arrive.
    pub fn select(&mut self, sector: Sector, year: Option<i32>) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        self.options.sector = sector;
        self.options.year = year;
        let ticket = self.issue_ticket();
        self.performance_ticket = Some(ticket);
        Some(FetchTicket(ticket))
    }

    pub fn set_highlight(&mut self, highlight: Option<String>) {
        self.options.highlight = highlight;
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
        self.boundary_ticket = None;
        self.performance_ticket = None;
        self.interaction = Interaction::default();
    }

    /// Apply the boundary fetch outcome. Returns `false` if it arrived late.
    pub fn complete_boundaries(
        &mut self,
        ticket: FetchTicket,
        result: Result<Arc<BoundaryCollection>, String>,
    ) -> bool {
        if !self.mounted || self.boundary_ticket != Some(ticket.0) {
            return false;
        }
        self.boundary_ticket = None;
        self.boundaries = match result {
            Ok(collection) => BoundaryStatus::Ready(collection),
            Err(reason) => BoundaryStatus::Failed(reason),
        };
        true
    }

    /// Apply performance rows. Returns `false` if it arrived late.
    pub fn complete_performance(
        &mut self,
        ticket: FetchTicket,
        resolved: ResolvedPerformance,
    ) -> bool {
        if !self.mounted || self.performance_ticket != Some(ticket.0) {
            return false;
        }
        self.performance_ticket = None;
        self.performance = resolved.records.into_iter().collect();
        self.performance_year = resolved.year;
        self.performance_pending = false;
        true
    }

    pub fn status(&self) -> ViewStatus<'_> {
        match &self.boundaries {
            BoundaryStatus::Failed(_) => ViewStatus::Failed(BOUNDARY_ERROR_MESSAGE),
            BoundaryStatus::Loading => ViewStatus::Loading,
            BoundaryStatus::Ready(_) if self.performance_pending => ViewStatus::Loading,
            BoundaryStatus::Ready(_) => ViewStatus::Ready,
        }
    }

    pub fn boundary_failure(&self) -> Option<&str> {
        match &self.boundaries {
            BoundaryStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn performance(&self) -> &PerformanceLookup {
        &self.performance
    }

    pub fn performance_year(&self) -> Option<i32> {
        self.performance_year
    }

    pub(crate) fn collection(&self) -> Option<&BoundaryCollection> {
        match &self.boundaries {
            BoundaryStatus::Ready(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn view_box(&self) -> ViewBox {
        self.collection()
            .map(|collection| ViewBox::fit(collection.coordinates()))
            .unwrap_or_default()
    }

    pub fn is_highlighted(&self, name: &str) -> bool {
        self.options
            .highlight
            .as_deref()
            .is_some_and(|highlight| highlight.to_lowercase() == name.to_lowercase())
    }

    pub fn counties(&self) -> Vec<CountySummary> {
        let Some(collection) = self.collection() else {
            return Vec::new();
        };
        let has_highlight = self.options.highlight.is_some();

        collection
            .features
            .iter()
            .map(|feature| {
                let record = self.performance.find(&feature.name);
                let highlighted = self.is_highlighted(&feature.name);
                CountySummary {
                    object_id: feature.object_id,
                    name: feature.name.clone(),
                    slug: county_slug(&feature.name),
                    color: record
                        .map(|r| r.tier().color())
                        .unwrap_or(NO_DATA_COLOR),
                    tier: record.map(|r| r.tier()),
                    score: record.map(|r| r.score),
                    rank: record.and_then(|r| r.rank),
                    highlighted,
                    dimmed: has_highlight && !highlighted,
                }
            })
            .collect()
    }

    /// Feed a pointer event. Returns `true` when a click produced a selection.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        if !self.mounted {
            return false;
        }
        let Some(selection) = self.interaction.handle(event) else {
            return false;
        };
        if let Some(callback) = self.on_select.as_mut() {
            callback(&selection.county);
        }
        true
    }

    pub fn hover_state(&self) -> &HoverState {
        self.interaction.state()
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        let HoverState::Hovering {
            county,
            position: PointerPosition { x, y },
        } = self.interaction.state()
        else {
            return None;
        };
        let record = self.performance.find(county);
        Some(Tooltip {
            county: county.clone(),
            score: record.map(|r| r.score),
            rank: record.and_then(|r| r.rank),
            left: x + TOOLTIP_OFFSET_X,
            top: y + TOOLTIP_OFFSET_Y,
        })
    }
}
