//! Stub Mapper - placeholder ↔ 실제 플러그인 컴포넌트 매핑
//!
//! placeholder → 슬롯 역색인은 생성 후 바뀌지 않으므로
//! `resolve_stub`은 해시 조회 + 슬롯 읽기 잠금 한 번으로 끝난다.

use super::pool::{PoolStats, StubPool};
use crate::component::{ComponentDeclaration, ComponentKind, ComponentName, LaunchMode};
use hostplug_foundation::{Error, Result, StubConfig};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

// ============================================================================
// StubGroup
// ============================================================================

/// Placeholder 풀 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubGroup {
    Activity(LaunchMode),
    Service,
}

impl StubGroup {
    pub const ALL: [StubGroup; 5] = [
        StubGroup::Activity(LaunchMode::Standard),
        StubGroup::Activity(LaunchMode::SingleTop),
        StubGroup::Activity(LaunchMode::SingleTask),
        StubGroup::Activity(LaunchMode::SingleInstance),
        StubGroup::Service,
    ];

    /// 선언에 맞는 풀 (provider/receiver는 placeholder를 쓰지 않는다)
    pub fn for_component(decl: &ComponentDeclaration) -> Option<StubGroup> {
        match decl.kind {
            ComponentKind::Activity => Some(StubGroup::Activity(decl.launch_mode)),
            ComponentKind::Service => Some(StubGroup::Service),
            ComponentKind::Provider | ComponentKind::Receiver => None,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            StubGroup::Activity(_) => ComponentKind::Activity,
            StubGroup::Service => ComponentKind::Service,
        }
    }

    /// 클래스 이름 그룹
    pub fn class_group(&self) -> &'static str {
        match self {
            StubGroup::Activity(mode) => mode.group_name(),
            StubGroup::Service => "Service",
        }
    }

    fn capacity(&self, config: &StubConfig) -> usize {
        match self {
            StubGroup::Activity(LaunchMode::Standard) => config.activities.standard,
            StubGroup::Activity(LaunchMode::SingleTop) => config.activities.single_top,
            StubGroup::Activity(LaunchMode::SingleTask) => config.activities.single_task,
            StubGroup::Activity(LaunchMode::SingleInstance) => config.activities.single_instance,
            StubGroup::Service => config.services,
        }
    }
}

impl fmt::Display for StubGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StubGroup::Activity(mode) => write!(f, "activity.{}", mode.group_name()),
            StubGroup::Service => f.write_str("service"),
        }
    }
}

// ============================================================================
// StubMapper
// ============================================================================

/// Placeholder 매퍼
pub struct StubMapper {
    pools: HashMap<StubGroup, StubPool>,
    /// placeholder -> (group, slot index)
    index: HashMap<ComponentName, (StubGroup, usize)>,
}

impl StubMapper {
    /// 설정에서 풀 생성
    pub fn from_config(host_package: &str, config: &StubConfig) -> Self {
        let mut pools = HashMap::new();
        let mut index = HashMap::new();

        for group in StubGroup::ALL {
            let placeholders: Vec<_> = (0..group.capacity(config))
                .map(|i| {
                    ComponentName::new(
                        host_package,
                        config.stub_class(host_package, group.class_group(), i),
                    )
                })
                .collect();
            for (slot, placeholder) in placeholders.iter().enumerate() {
                index.insert(placeholder.clone(), (group, slot));
            }
            pools.insert(group, StubPool::new(group.to_string(), placeholders));
        }

        debug!(host = host_package, placeholders = index.len(), "Stub pools created");
        Self { pools, index }
    }

    /// 실제 컴포넌트용 슬롯 점유
    ///
    /// 호출마다 새 슬롯을 받는다. 풀이 가득 차면 `Error::CapacityExceeded`.
    pub fn acquire_stub(&self, group: StubGroup, real: &ComponentName) -> Result<ComponentName> {
        let pool = self.pool(group)?;
        match pool.acquire(real) {
            Ok((_, placeholder)) => {
                debug!(real = %real, placeholder = %placeholder, "Stub acquired");
                Ok(placeholder)
            }
            Err(e) => {
                warn!(group = %group, real = %real, capacity = pool.capacity(), "Stub pool exhausted");
                Err(e)
            }
        }
    }

    /// 선언에 맞는 풀에서 슬롯 점유
    pub fn acquire_for(&self, decl: &ComponentDeclaration, real: &ComponentName) -> Result<ComponentName> {
        let group = StubGroup::for_component(decl).ok_or_else(|| {
            Error::InvalidInput(format!(
                "{} components do not use placeholders",
                decl.kind
            ))
        })?;
        self.acquire_stub(group, real)
    }

    /// placeholder → 현재 대상
    pub fn resolve_stub(&self, placeholder: &ComponentName) -> Option<ComponentName> {
        let (group, slot) = self.index.get(placeholder)?;
        self.pools.get(group)?.target(*slot)
    }

    /// 슬롯 반환. 점유 중이었으면 true
    pub fn release(&self, placeholder: &ComponentName) -> bool {
        let Some((group, slot)) = self.index.get(placeholder) else {
            return false;
        };
        let released = self
            .pools
            .get(group)
            .map(|pool| pool.release(*slot))
            .unwrap_or(false);
        if released {
            debug!(placeholder = %placeholder, "Stub released");
        }
        released
    }

    /// 이미 대상을 맡고 있는 placeholder
    pub fn find_placeholder(&self, group: StubGroup, real: &ComponentName) -> Option<ComponentName> {
        self.pools
            .get(&group)?
            .find(real)
            .map(|(_, placeholder)| placeholder)
    }

    pub fn is_placeholder(&self, name: &ComponentName) -> bool {
        self.index.contains_key(name)
    }

    /// 선언된 모든 placeholder (host 매니페스트에 들어가야 하는 목록)
    pub fn placeholders(&self) -> Vec<(StubGroup, ComponentName)> {
        let mut all: Vec<_> = self
            .index
            .iter()
            .map(|(name, (group, slot))| (*group, *slot, name.clone()))
            .collect();
        all.sort_by(|a, b| a.2.cmp(&b.2));
        all.into_iter().map(|(group, _, name)| (group, name)).collect()
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        StubGroup::ALL
            .iter()
            .filter_map(|group| self.pools.get(group))
            .map(StubPool::stats)
            .collect()
    }

    fn pool(&self, group: StubGroup) -> Result<&StubPool> {
        self.pools
            .get(&group)
            .ok_or_else(|| Error::capacity(group.to_string(), 0))
    }
}
