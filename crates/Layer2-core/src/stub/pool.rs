//! Stub Pool - 고정 크기 placeholder 슬롯 풀

use crate::component::ComponentName;
use hostplug_foundation::{Error, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 슬롯 하나
struct StubSlot {
    placeholder: ComponentName,
    in_use: AtomicBool,
    target: RwLock<Option<ComponentName>>,
}

/// 풀 통계
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub name: String,
    pub capacity: usize,
    pub in_use: usize,
}

/// 같은 그룹의 placeholder 슬롯 모음
pub struct StubPool {
    name: String,
    slots: Vec<StubSlot>,
    /// 다음 탐색 시작 위치
    cursor: AtomicUsize,
}

impl StubPool {
    pub fn new(name: impl Into<String>, placeholders: Vec<ComponentName>) -> Self {
        Self {
            name: name.into(),
            slots: placeholders
                .into_iter()
                .map(|placeholder| StubSlot {
                    placeholder,
                    in_use: AtomicBool::new(false),
                    target: RwLock::new(None),
                })
                .collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn in_use(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.in_use.load(Ordering::Acquire))
            .count()
    }

    pub fn placeholder(&self, index: usize) -> Option<&ComponentName> {
        self.slots.get(index).map(|slot| &slot.placeholder)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &ComponentName> {
        self.slots.iter().map(|slot| &slot.placeholder)
    }

    /// 빈 슬롯을 점유하고 대상 기록
    ///
    /// 슬롯 점유는 CAS로 하므로 두 호출자가 같은 슬롯을 받지 않는다.
    pub fn acquire(&self, real: &ComponentName) -> Result<(usize, ComponentName)> {
        let capacity = self.slots.len();
        if capacity == 0 {
            return Err(Error::capacity(&self.name, 0));
        }

        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % capacity;
        for offset in 0..capacity {
            let index = (start + offset) % capacity;
            let slot = &self.slots[index];
            if slot
                .in_use
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                *slot.target.write() = Some(real.clone());
                return Ok((index, slot.placeholder.clone()));
            }
        }

        Err(Error::capacity(&self.name, capacity))
    }

    /// 슬롯의 현재 대상
    pub fn target(&self, index: usize) -> Option<ComponentName> {
        self.slots.get(index).and_then(|slot| slot.target.read().clone())
    }

    /// 슬롯 반환. 점유 중이었으면 true
    pub fn release(&self, index: usize) -> bool {
        let Some(slot) = self.slots.get(index) else {
            return false;
        };
        if !slot.in_use.load(Ordering::Acquire) {
            return false;
        }
        *slot.target.write() = None;
        slot.in_use.swap(false, Ordering::AcqRel)
    }

    /// 대상이 점유 중인 슬롯 찾기
    pub fn find(&self, real: &ComponentName) -> Option<(usize, ComponentName)> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            let held = slot.in_use.load(Ordering::Acquire)
                && slot.target.read().as_ref() == Some(real);
            held.then(|| (index, slot.placeholder.clone()))
        })
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            name: self.name.clone(),
            capacity: self.capacity(),
            in_use: self.in_use(),
        }
    }
}
