use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use winit::event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent};

/// 카메라는 값 타입. 움직이면 새 카메라를 만들어서 바꿔 끼움.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    // 도(degree) 단위
    pub vertical_fov: f32,
    pub aspect_ratio: f32,
    pub near_plane_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, -3.0),
            target: Point3::new(0.0, 0.0, 1.0),
            vertical_fov: 45.0,
            aspect_ratio: 1.0,
            near_plane_distance: 0.1,
        }
    }
}

impl Camera {
    pub fn with_position(self, position: Point3<f32>) -> Self {
        Self { position, ..self }
    }

    pub fn with_target(self, target: Point3<f32>) -> Self {
        Self { target, ..self }
    }

    pub fn with_vertical_fov(self, vertical_fov: f32) -> Self {
        Self { vertical_fov, ..self }
    }

    pub fn with_aspect_ratio(self, aspect_ratio: f32) -> Self {
        Self { aspect_ratio, ..self }
    }

    pub fn with_near_plane_distance(self, near_plane_distance: f32) -> Self {
        Self {
            near_plane_distance,
            ..self
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.target - self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Forward,
    Backward,
    Left,
    Right,
    TurnLeft,
    TurnRight,
    TurnUp,
    TurnDown,
}

/// 키보드 입력을 모아뒀다가 매 프레임 새 카메라를 계산해 줌
#[derive(Debug, Default)]
pub struct CameraController {
    // W S A D ← → ↑ ↓
    inputs: [bool; 8],
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    // true: 카메라가 처리한 입력
    pub fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state,
                        virtual_keycode: Some(key),
                        ..
                    },
                ..
            } => self.set_key(*key, matches!(state, ElementState::Pressed)),
            _ => false,
        }
    }

    pub fn set_key(&mut self, key: VirtualKeyCode, is_press: bool) -> bool {
        let key = match key {
            VirtualKeyCode::W => Key::Forward,
            VirtualKeyCode::S => Key::Backward,
            VirtualKeyCode::A => Key::Left,
            VirtualKeyCode::D => Key::Right,
            VirtualKeyCode::Left => Key::TurnLeft,
            VirtualKeyCode::Right => Key::TurnRight,
            VirtualKeyCode::Up => Key::TurnUp,
            VirtualKeyCode::Down => Key::TurnDown,
            _ => return false,
        };

        self.inputs[key as usize] = is_press;
        true
    }

    pub fn is_idle(&self) -> bool {
        self.inputs.iter().all(|pressed| !pressed)
    }

    pub fn movement_speed(&self) -> f32 {
        0.5
    }

    pub fn rotation_speed(&self) -> f32 {
        0.5
    }

    fn axis(&self, positive: Key, negative: Key) -> f32 {
        self.inputs[positive as usize] as u8 as f32 - self.inputs[negative as usize] as u8 as f32
    }

    pub fn update(&self, camera: Camera, time_step: f32) -> Camera {
        if self.is_idle() {
            return camera;
        }

        let forward_input = self.axis(Key::Forward, Key::Backward);
        let side_input = self.axis(Key::Right, Key::Left);
        let yaw_input = self.axis(Key::TurnRight, Key::TurnLeft);
        let pitch_input = self.axis(Key::TurnDown, Key::TurnUp);

        let up: Unit<Vector3<f32>> = Vector3::y_axis();
        let forward = camera.forward();
        let right = up.cross(&forward);

        // 가속 없음
        let step = self.movement_speed() * time_step;
        let position = camera.position + right * side_input * step + forward * forward_input * step;

        let pitch_delta = pitch_input * self.rotation_speed() * time_step;
        let yaw_delta = yaw_input * self.rotation_speed() * time_step;

        let yaw = UnitQuaternion::from_axis_angle(&up, yaw_delta);
        // forward가 up과 평행하면 right가 0이 되니 pitch는 건너뜀
        let rotation = match Unit::try_new(right, f32::EPSILON) {
            Some(right) => UnitQuaternion::from_axis_angle(&right, pitch_delta) * yaw,
            None => yaw,
        };

        Camera {
            position,
            target: position + rotation * forward,
            ..camera
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn default_camera_values() {
        let camera = Camera::default();

        assert_eq!(camera.position, Point3::new(0.0, 0.0, -3.0));
        assert_eq!(camera.target, Point3::new(0.0, 0.0, 1.0));
        assert_eq!(camera.vertical_fov, 45.0);
        assert_eq!(camera.near_plane_distance, 0.1);
        assert_eq!(camera.aspect_ratio, 1.0);
    }

    #[test]
    fn with_overrides_only_one_field() {
        let camera = Camera::default().with_aspect_ratio(2.0);

        assert_eq!(camera.aspect_ratio, 2.0);
        assert_eq!(camera, Camera { aspect_ratio: 2.0, ..Camera::default() });
    }

    #[test]
    fn idle_controller_keeps_camera() {
        let controller = CameraController::new();
        let camera = Camera::default();

        assert_eq!(controller.update(camera, 0.016), camera);
    }

    #[test]
    fn forward_key_moves_along_view_direction() {
        let mut controller = CameraController::new();
        assert!(controller.set_key(VirtualKeyCode::W, true));

        let camera = Camera::default();
        let moved = controller.update(camera, 1.0);

        // forward = (0, 0, 4), 속도 0.5
        assert_relative_eq!(moved.position, Point3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
        assert_relative_eq!(moved.forward(), camera.forward(), epsilon = 1e-5);
    }

    #[test]
    fn turning_keeps_position() {
        let mut controller = CameraController::new();
        controller.set_key(VirtualKeyCode::Right, true);

        let camera = Camera::default();
        let turned = controller.update(camera, 1.0);

        assert_eq!(turned.position, camera.position);
        assert!(turned.forward().x.abs() > 0.0);
        assert_relative_eq!(turned.forward().norm(), camera.forward().norm(), epsilon = 1e-4);
    }

    #[test]
    fn released_key_stops_movement() {
        let mut controller = CameraController::new();
        controller.set_key(VirtualKeyCode::A, true);
        controller.set_key(VirtualKeyCode::A, false);

        assert!(controller.is_idle());
        assert!(!controller.set_key(VirtualKeyCode::Space, true));
    }
}
