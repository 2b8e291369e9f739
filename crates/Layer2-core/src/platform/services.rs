//! Component Manager Proxy - 플러그인 service 요청 리다이렉트
//!
//! 플러그인 service 하나는 placeholder 하나를 쓴다. start와 bind는 같은
//! placeholder를 공유하고, stop 또는 명시적으로 시작되지 않은 service의
//! 마지막 unbind에서 슬롯을 반환한다.
//!
//! 조회-또는-점유와 host 호출은 service 테이블 잠금 하나로 직렬화한다.
//! 기본 component manager는 이 프록시로 다시 들어오지 않아야 한다.

use super::host::{ComponentManager, ConnectionId};
use crate::component::{ComponentName, ComponentRequest, ResolutionFlags};
use crate::resolver::ComponentResolver;
use crate::stub::{StubGroup, StubMapper};
use hostplug_foundation::Result;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// 설치 확인용 식별자
pub const COMPONENT_MANAGER_PROXY_ID: &str = "hostplug.ComponentManagerProxy";

/// 실행 중인 플러그인 service
struct ServiceRecord {
    placeholder: ComponentName,
    /// start_service로 시작되었는지
    started: bool,
    connections: HashSet<ConnectionId>,
}

impl ServiceRecord {
    fn is_idle(&self) -> bool {
        !self.started && self.connections.is_empty()
    }
}

#[derive(Default)]
struct ServiceTable {
    services: HashMap<ComponentName, ServiceRecord>,
    connections: HashMap<ConnectionId, ComponentName>,
}

impl ServiceTable {
    /// 연결을 떼어내고, 그 때문에 유휴가 된 service를 돌려준다
    fn detach(&mut self, connection: ConnectionId) -> Option<(ComponentName, ServiceRecord)> {
        let real = self.connections.remove(&connection)?;
        let record = self.services.get_mut(&real)?;
        record.connections.remove(&connection);
        if !record.is_idle() {
            return None;
        }
        self.services.remove(&real).map(|record| (real, record))
    }
}

/// 이번 호출의 placeholder
struct Slot {
    placeholder: ComponentName,
    /// 이번 호출에서 새로 점유했는지
    fresh: bool,
}

/// service 리다이렉트 데코레이터
pub struct ComponentManagerProxy {
    base: Arc<dyn ComponentManager>,
    resolver: ComponentResolver,
    stubs: Arc<StubMapper>,
    table: Mutex<ServiceTable>,
}

impl ComponentManagerProxy {
    pub fn new(
        base: Arc<dyn ComponentManager>,
        resolver: ComponentResolver,
        stubs: Arc<StubMapper>,
    ) -> Self {
        Self {
            base,
            resolver,
            stubs,
            table: Mutex::new(ServiceTable::default()),
        }
    }

    pub fn base(&self) -> &Arc<dyn ComponentManager> {
        &self.base
    }

    fn resolve_real(&self, request: &ComponentRequest) -> Option<ComponentName> {
        self.resolver
            .resolve_service(request, ResolutionFlags::NONE)
            .map(|result| result.component_name())
    }

    /// 실행 중이면 기존 placeholder, 아니면 새 슬롯
    fn slot(&self, table: &ServiceTable, real: &ComponentName) -> Result<Slot> {
        if let Some(record) = table.services.get(real) {
            return Ok(Slot {
                placeholder: record.placeholder.clone(),
                fresh: false,
            });
        }
        let placeholder = self.stubs.acquire_stub(StubGroup::Service, real)?;
        Ok(Slot {
            placeholder,
            fresh: true,
        })
    }

    /// 실패한 호출 정리: 새 슬롯은 반환, 기존 service가 유휴로 남았으면 내린다
    fn rollback(&self, table: &mut ServiceTable, real: &ComponentName, slot: &Slot) {
        if slot.fresh {
            self.stubs.release(&slot.placeholder);
            return;
        }
        if table.services.get(real).is_some_and(ServiceRecord::is_idle) {
            if let Some(record) = table.services.remove(real) {
                self.destroy_idle(real, record);
            }
        }
    }

    /// 유휴 service를 host에서 내리고 슬롯 반환
    fn destroy_idle(&self, real: &ComponentName, record: ServiceRecord) {
        let request = ComponentRequest::explicit(real.package.as_str(), real.class.as_str())
            .redirect_to(&record.placeholder, real);
        if let Err(e) = self.base.stop_service(&request) {
            warn!(real = %real, error = %e, "Failed to stop unbound plugin service");
        }
        self.stubs.release(&record.placeholder);
        debug!(real = %real, placeholder = %record.placeholder, "Unbound plugin service destroyed");
    }
}

impl ComponentManager for ComponentManagerProxy {
    fn identity(&self) -> &str {
        COMPONENT_MANAGER_PROXY_ID
    }

    fn start_service(&self, request: &ComponentRequest) -> Result<Option<ComponentName>> {
        let Some(real) = self.resolve_real(request) else {
            return self.base.start_service(request);
        };

        let mut table = self.table.lock();
        let slot = self.slot(&table, &real)?;
        let redirected = request.redirect_to(&slot.placeholder, &real);
        match self.base.start_service(&redirected) {
            Ok(Some(_)) => {
                debug!(real = %real, placeholder = %slot.placeholder, "Plugin service started");
                table
                    .services
                    .entry(real.clone())
                    .or_insert_with(|| ServiceRecord {
                        placeholder: slot.placeholder.clone(),
                        started: false,
                        connections: HashSet::new(),
                    })
                    .started = true;
                Ok(Some(real))
            }
            Ok(None) => {
                warn!(placeholder = %slot.placeholder, "Host did not start placeholder service");
                self.rollback(&mut table, &real, &slot);
                Ok(None)
            }
            Err(e) => {
                self.rollback(&mut table, &real, &slot);
                Err(e)
            }
        }
    }

    fn stop_service(&self, request: &ComponentRequest) -> Result<bool> {
        let Some(real) = self.resolve_real(request) else {
            return self.base.stop_service(request);
        };

        let mut table = self.table.lock();
        let Some(record) = table.services.remove(&real) else {
            debug!(real = %real, "Plugin service is not running");
            return Ok(false);
        };
        for connection in &record.connections {
            table.connections.remove(connection);
        }

        let stopped = self
            .base
            .stop_service(&request.redirect_to(&record.placeholder, &real));
        self.stubs.release(&record.placeholder);
        let stopped = stopped?;
        debug!(real = %real, placeholder = %record.placeholder, stopped, "Plugin service stopped");
        Ok(stopped)
    }

    fn bind_service(&self, request: &ComponentRequest, connection: ConnectionId) -> Result<bool> {
        let Some(real) = self.resolve_real(request) else {
            return self.base.bind_service(request, connection);
        };

        let mut table = self.table.lock();
        // 같은 연결을 다시 쓰면 이전 바인딩은 끊긴 것으로 본다
        if let Some((previous, record)) = table.detach(connection) {
            if previous != real {
                self.destroy_idle(&previous, record);
            } else {
                table.services.insert(previous, record);
            }
        }

        let slot = self.slot(&table, &real)?;
        let redirected = request.redirect_to(&slot.placeholder, &real);
        match self.base.bind_service(&redirected, connection) {
            Ok(true) => {
                table
                    .services
                    .entry(real.clone())
                    .or_insert_with(|| ServiceRecord {
                        placeholder: slot.placeholder.clone(),
                        started: false,
                        connections: HashSet::new(),
                    })
                    .connections
                    .insert(connection);
                table.connections.insert(connection, real);
                Ok(true)
            }
            Ok(false) => {
                self.rollback(&mut table, &real, &slot);
                Ok(false)
            }
            Err(e) => {
                self.rollback(&mut table, &real, &slot);
                Err(e)
            }
        }
    }

    fn unbind_service(&self, connection: ConnectionId) -> Result<bool> {
        let mut table = self.table.lock();
        let unbound = self.base.unbind_service(connection)?;
        if let Some((real, record)) = table.detach(connection) {
            self.destroy_idle(&real, record);
        }
        Ok(unbound)
    }
}
