//! 流水线错误类型
//!
//! 只有传输层失败（网络、鉴权、超时）会以错误的形式向上传播；
//! LLM输出解析失败一律在Agent内部以兜底值吸收，不会出现在这里。

use std::fmt;

use crate::generator::blackboard::{AgentStatus, AgentType, IntelligenceState};

/// 外部服务类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Llm,
    Search,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Llm => write!(f, "llm"),
            Service::Search => write!(f, "search"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 缺少必需的服务凭证，在任何网络调用之前检出
    #[error("missing credential: {0} is not configured")]
    MissingCredential(&'static str),

    /// 外部服务调用失败
    #[error("{service} request failed: {message}")]
    Transport { service: Service, message: String },

    /// 外部服务调用超时
    #[error("{service} request timed out after {seconds}s")]
    Timeout { service: Service, seconds: u64 },

    /// Agent所需的前置数据不可用
    #[error("required input `{source_name}` is not available for the {agent} agent")]
    MissingInput {
        agent: AgentType,
        source_name: &'static str,
    },

    /// 非法的状态迁移
    #[error("invalid status transition for the {agent} agent: {from} -> {to}")]
    InvalidTransition {
        agent: AgentType,
        from: AgentStatus,
        to: AgentStatus,
    },

    /// 某个Agent执行失败，携带失败时的部分结果
    #[error("{agent} agent failed: {source}")]
    StepFailed {
        agent: AgentType,
        state: Box<IntelligenceState>,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn transport(service: Service, message: impl Into<String>) -> Self {
        Self::Transport {
            service,
            message: message.into(),
        }
    }

    /// 失败时已经写入的部分黑板数据
    pub fn partial_state(&self) -> Option<&IntelligenceState> {
        match self {
            Self::StepFailed { state, .. } => Some(state),
            _ => None,
        }
    }

    /// 是否属于传输层失败
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::StepFailed { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}
