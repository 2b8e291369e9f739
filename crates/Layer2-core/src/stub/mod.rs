//! Stub - host 매니페스트에 미리 선언된 placeholder 관리
//!
//! 플러그인 컴포넌트는 host에 선언되어 있지 않으므로, 실행 요청은
//! 비어 있는 placeholder로 바꿔 host에 넘기고 인스턴스 생성 시점에
//! 다시 실제 컴포넌트로 되돌린다.

mod mapper;
mod pool;

pub use mapper::{StubGroup, StubMapper};
pub use pool::{PoolStats, StubPool};
