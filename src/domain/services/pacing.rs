// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::PacingSettings;
use rand::Rng;
use std::fmt;
use std::time::Duration;
use tracing::info;

/// 暂停等级
///
/// 等级越高，基础时长和随机抖动越大
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PauseTier {
    VeryShort,
    Short,
    Long,
    VeryLong,
    UltraLong,
}

impl PauseTier {
    /// 基础时长（秒）
    pub fn base_secs(self) -> f64 {
        match self {
            PauseTier::VeryShort => 0.5,
            PauseTier::Short => 3.0,
            PauseTier::Long => 10.0,
            PauseTier::VeryLong => 100.0,
            PauseTier::UltraLong => 1000.0,
        }
    }

    /// 随机抖动上限（秒）
    pub fn variable_secs(self) -> f64 {
        match self {
            PauseTier::VeryShort => 0.5,
            PauseTier::Short => 3.0,
            PauseTier::Long => 10.0,
            PauseTier::VeryLong => 100.0,
            PauseTier::UltraLong => 1000.0,
        }
    }

    /// 在 `[base, base + variable)` 内采样一次时长
    pub fn sample_with<R: Rng>(self, rng: &mut R) -> Duration {
        let jitter: f64 = rng.random::<f64>() * self.variable_secs();
        Duration::from_secs_f64(self.base_secs() + jitter)
    }
}

impl fmt::Display for PauseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PauseTier::VeryShort => "very short",
            PauseTier::Short => "short",
            PauseTier::Long => "long",
            PauseTier::VeryLong => "very long",
            PauseTier::UltraLong => "ultra long",
        };
        f.write_str(label)
    }
}

/// 暂停计划
///
/// 按累计概率划分 `[0, 1)`，一次均匀采样决定本次的暂停等级，`None` 表示不暂停
#[derive(Debug, Clone, Copy)]
pub struct PauseSchedule {
    pub name: &'static str,
    steps: &'static [(f64, Option<PauseTier>)],
}

impl PauseSchedule {
    /// 两次数量探测之间
    pub const PROBE: PauseSchedule = PauseSchedule {
        name: "probe",
        steps: &[
            (0.60, Some(PauseTier::Short)),
            (0.95, Some(PauseTier::VeryShort)),
            (1.00, None),
        ],
    };

    /// 两个分页步骤之间，偶尔出现长暂停
    pub const STEP: PauseSchedule = PauseSchedule {
        name: "step",
        steps: &[
            (0.01, Some(PauseTier::UltraLong)),
            (0.05, Some(PauseTier::VeryLong)),
            (0.10, Some(PauseTier::Long)),
            (0.90, Some(PauseTier::Short)),
            (1.00, Some(PauseTier::VeryShort)),
        ],
    };

    /// 下载详情页之后
    pub const DETAIL: PauseSchedule = PauseSchedule {
        name: "detail",
        steps: &[
            (0.10, Some(PauseTier::Long)),
            (0.65, Some(PauseTier::Short)),
            (0.95, Some(PauseTier::VeryShort)),
            (1.00, None),
        ],
    };

    /// 根据 `[0, 1)` 内的采样值选出暂停等级
    pub fn pick(&self, draw: f64) -> Option<PauseTier> {
        self.steps
            .iter()
            .find(|(upper, _)| draw < *upper)
            .and_then(|(_, tier)| *tier)
    }

    /// 各等级的概率，`None` 对应不暂停
    pub fn probabilities(&self) -> Vec<(Option<PauseTier>, f64)> {
        let mut lower = 0.0;
        self.steps
            .iter()
            .map(|(upper, tier)| {
                let p = upper - lower;
                lower = *upper;
                (*tier, p)
            })
            .collect()
    }
}

/// 节奏控制器
///
/// 在请求之间插入随机等待，同时也用作出错后的退避
#[derive(Debug, Clone)]
pub struct Pacer {
    time_scale: f64,
}

impl Pacer {
    pub fn new(settings: &PacingSettings) -> Self {
        Self {
            time_scale: settings.time_scale.max(0.0),
        }
    }

    /// 不实际等待，仅记录日志
    pub fn disabled() -> Self {
        Self { time_scale: 0.0 }
    }

    pub fn is_disabled(&self) -> bool {
        self.time_scale == 0.0
    }

    /// 按等级暂停
    pub async fn pause(&self, tier: PauseTier) {
        let sampled = tier.sample_with(&mut rand::rng());
        info!("{} pause: {:.2}s...", tier, sampled.as_secs_f64());
        self.sleep(sampled).await;
    }

    /// 按计划抽取等级后暂停
    pub async fn pause_drawn(&self, schedule: &PauseSchedule) {
        let draw: f64 = rand::random();
        if let Some(tier) = schedule.pick(draw) {
            self.pause(tier).await;
        }
    }

    /// 固定时长的等待，同样受 time_scale 影响
    pub async fn sleep(&self, duration: Duration) {
        if self.is_disabled() {
            return;
        }
        tokio::time::sleep(duration.mul_f64(self.time_scale)).await;
    }
}
