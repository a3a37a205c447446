//! 节点类型
//!
//! 链式拓扑中的节点既承载流端点，也为过路包做转发。

use super::id::NodeId;
use crate::cc::CcVariant;

/// 网络节点
#[derive(Debug)]
pub struct Host {
    id: NodeId,
    name: String,
    /// 该节点后续创建的可靠流默认使用的拥塞控制变体。
    /// 只允许在实验启动前修改。
    cc_default: CcVariant,
}

impl Host {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cc_default: CcVariant::NewReno,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cc_default(&self) -> CcVariant {
        self.cc_default
    }

    pub fn set_cc_default(&mut self, variant: CcVariant) {
        self.cc_default = variant;
    }
}
