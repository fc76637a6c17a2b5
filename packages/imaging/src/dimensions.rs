use crate::params::{FitPolicy, ResizeSpec};

/// What a resize step does, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePlan {
    /// Resample straight to this size.
    Exact { width: u32, height: u32 },
    /// Resample to `scaled`, then cut a centred `target` window out of it.
    CropToFit {
        scaled: (u32, u32),
        target: (u32, u32),
    },
    /// Resample to `scaled`, then centre it on a black `target` canvas.
    PadToFit {
        scaled: (u32, u32),
        target: (u32, u32),
    },
}

impl ResizePlan {
    /// Final size after the step.
    pub fn output(&self) -> (u32, u32) {
        match *self {
            Self::Exact { width, height } => (width, height),
            Self::CropToFit { target, .. } | Self::PadToFit { target, .. } => target,
        }
    }
}

fn apply_scale(src_w: u32, src_h: u32, scale: f64) -> (u32, u32) {
    let w = (src_w as f64 * scale).round() as u32;
    let h = (src_h as f64 * scale).round() as u32;
    (w.max(1), h.max(1))
}

/// Plan a resize of a `src_w`x`src_h` image. `None` when neither side is given.
pub fn plan_resize(src_w: u32, src_h: u32, spec: &ResizeSpec) -> Option<ResizePlan> {
    let (target_w, target_h) = match (spec.width, spec.height) {
        (None, None) => return None,
        // One side given: the other follows the aspect ratio whatever the fit.
        (Some(w), None) => {
            let (_, height) = apply_scale(src_w, src_h, w as f64 / src_w as f64);
            return Some(ResizePlan::Exact {
                width: w.max(1),
                height,
            });
        }
        (None, Some(h)) => {
            let (width, _) = apply_scale(src_w, src_h, h as f64 / src_h as f64);
            return Some(ResizePlan::Exact {
                width,
                height: h.max(1),
            });
        }
        (Some(w), Some(h)) => (w.max(1), h.max(1)),
    };

    let scale_w = target_w as f64 / src_w as f64;
    let scale_h = target_h as f64 / src_h as f64;
    let plan = match spec.fit {
        FitPolicy::Fill => ResizePlan::Exact {
            width: target_w,
            height: target_h,
        },
        FitPolicy::Inside => {
            let (width, height) = apply_scale(src_w, src_h, scale_w.min(scale_h));
            ResizePlan::Exact { width, height }
        }
        FitPolicy::Outside => {
            let (width, height) = apply_scale(src_w, src_h, scale_w.max(scale_h));
            ResizePlan::Exact { width, height }
        }
        FitPolicy::Cover => {
            let (w, h) = apply_scale(src_w, src_h, scale_w.max(scale_h));
            ResizePlan::CropToFit {
                scaled: (w.max(target_w), h.max(target_h)),
                target: (target_w, target_h),
            }
        }
        FitPolicy::Contain => {
            let (w, h) = apply_scale(src_w, src_h, scale_w.min(scale_h));
            ResizePlan::PadToFit {
                scaled: (w.min(target_w), h.min(target_h)),
                target: (target_w, target_h),
            }
        }
    };
    Some(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(width: Option<u32>, height: Option<u32>, fit: FitPolicy) -> ResizeSpec {
        ResizeSpec { width, height, fit }
    }

    #[test]
    fn nothing_requested_is_no_plan() {
        assert_eq!(plan_resize(100, 100, &spec(None, None, FitPolicy::Fill)), None);
    }

    #[test]
    fn single_side_keeps_aspect_ratio() {
        for fit in [FitPolicy::Cover, FitPolicy::Fill, FitPolicy::Contain] {
            let plan = plan_resize(400, 300, &spec(Some(200), None, fit)).unwrap();
            assert_eq!(plan.output(), (200, 150));
            let plan = plan_resize(400, 300, &spec(None, Some(600), fit)).unwrap();
            assert_eq!(plan.output(), (800, 600));
        }
    }

    #[test]
    fn fill_is_exact() {
        let plan = plan_resize(400, 300, &spec(Some(123), Some(456), FitPolicy::Fill)).unwrap();
        assert_eq!(plan, ResizePlan::Exact { width: 123, height: 456 });
    }

    #[test]
    fn inside_and_outside() {
        let inside = plan_resize(400, 300, &spec(Some(200), Some(200), FitPolicy::Inside)).unwrap();
        assert_eq!(inside.output(), (200, 150));
        let outside =
            plan_resize(400, 300, &spec(Some(200), Some(200), FitPolicy::Outside)).unwrap();
        assert_eq!(outside.output(), (267, 200));
    }

    #[test]
    fn cover_and_contain_hit_box_exactly() {
        let cover = plan_resize(400, 300, &spec(Some(200), Some(200), FitPolicy::Cover)).unwrap();
        assert_eq!(
            cover,
            ResizePlan::CropToFit {
                scaled: (267, 200),
                target: (200, 200)
            }
        );
        let contain =
            plan_resize(400, 300, &spec(Some(200), Some(200), FitPolicy::Contain)).unwrap();
        assert_eq!(
            contain,
            ResizePlan::PadToFit {
                scaled: (200, 150),
                target: (200, 200)
            }
        );
    }

    #[test]
    fn tiny_results_are_at_least_one_pixel() {
        let plan = plan_resize(5000, 10, &spec(Some(1), None, FitPolicy::Cover)).unwrap();
        assert_eq!(plan.output(), (1, 1));
    }
}
