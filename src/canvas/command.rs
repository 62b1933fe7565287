//! Scene mutations.
//!
//! Every canvas edit is one [`Command`]. Applying a command either changes
//! the scene and reports what should be selected afterwards, or returns
//! `None` and leaves the scene untouched (unknown id, unsupported kind,
//! geometry that is non-finite or outside the coordinate limit). The editor records one snapshot per applied
//! command.

use uuid::Uuid;

use super::{Color, MAX_SCALE, ObjectId, ObjectKind, Scene, SceneObject, in_range};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(SceneObject),
    Remove(ObjectId),
    Duplicate { id: ObjectId, offset: f32 },
    Move { id: ObjectId, left: f32, top: f32 },
    Scale { id: ObjectId, scale_x: f32, scale_y: f32 },
    Resize { id: ObjectId, width: f32, height: f32 },
    SetText { id: ObjectId, text: String },
    SetFill { id: ObjectId, fill: Color },
    BringToFront(ObjectId),
    SendToBack(ObjectId),
    Clear,
}

/// Selection change requested by an applied command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Select(ObjectId),
    Deselect,
    Keep,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Remove(_) => "remove",
            Command::Duplicate { .. } => "duplicate",
            Command::Move { .. } => "move",
            Command::Scale { .. } => "scale",
            Command::Resize { .. } => "resize",
            Command::SetText { .. } => "set_text",
            Command::SetFill { .. } => "set_fill",
            Command::BringToFront(_) => "bring_to_front",
            Command::SendToBack(_) => "send_to_back",
            Command::Clear => "clear",
        }
    }

    pub fn apply(self, scene: &mut Scene) -> Option<Selection> {
        match self {
            Command::Add(object) => {
                if scene.contains(object.id) || object.check().is_err() {
                    return None;
                }
                let id = object.id;
                scene.objects.push(object);
                Some(Selection::Select(id))
            }
            Command::Remove(id) => {
                let index = scene.index_of(id)?;
                scene.objects.remove(index);
                Some(Selection::Deselect)
            }
            Command::Duplicate { id, offset } => {
                let mut copy = scene.get(id)?.clone();
                copy.id = Uuid::new_v4();
                copy.left += offset;
                copy.top += offset;
                if !(in_range(copy.left) && in_range(copy.top)) {
                    return None;
                }
                let new_id = copy.id;
                scene.objects.push(copy);
                Some(Selection::Select(new_id))
            }
            Command::Move { id, left, top } => {
                if !(in_range(left) && in_range(top)) {
                    return None;
                }
                let object = scene.get_mut(id)?;
                object.left = left;
                object.top = top;
                Some(Selection::Keep)
            }
            Command::Scale {
                id,
                scale_x,
                scale_y,
            } => {
                if !(positive(scale_x) && positive(scale_y)) {
                    return None;
                }
                match &mut scene.get_mut(id)?.kind {
                    ObjectKind::Image(img) => {
                        img.scale_x = scale_x;
                        img.scale_y = scale_y;
                        Some(Selection::Keep)
                    }
                    _ => None,
                }
            }
            Command::Resize { id, width, height } => {
                if !(in_range(width) && in_range(height)) || width < 0.0 || height < 0.0 {
                    return None;
                }
                match &mut scene.get_mut(id)?.kind {
                    ObjectKind::Shape(shape) => {
                        shape.width = width;
                        shape.height = height;
                        Some(Selection::Keep)
                    }
                    ObjectKind::Text(text) if width > 0.0 => {
                        text.width = width;
                        Some(Selection::Keep)
                    }
                    _ => None,
                }
            }
            Command::SetText { id, text } => match &mut scene.get_mut(id)?.kind {
                ObjectKind::Text(t) => {
                    t.text = text;
                    Some(Selection::Keep)
                }
                ObjectKind::Icon(icon) => {
                    icon.content = text;
                    Some(Selection::Keep)
                }
                _ => None,
            },
            Command::SetFill { id, fill } => match &mut scene.get_mut(id)?.kind {
                ObjectKind::Text(t) => {
                    t.fill = fill;
                    Some(Selection::Keep)
                }
                ObjectKind::Shape(shape) => {
                    shape.fill = Some(fill);
                    Some(Selection::Keep)
                }
                ObjectKind::Icon(icon) => {
                    icon.fill = fill;
                    Some(Selection::Keep)
                }
                ObjectKind::Image(_) => None,
            },
            Command::BringToFront(id) => {
                let index = scene.index_of(id)?;
                let object = scene.objects.remove(index);
                scene.objects.push(object);
                Some(Selection::Keep)
            }
            Command::SendToBack(id) => {
                let index = scene.index_of(id)?;
                let object = scene.objects.remove(index);
                scene.objects.insert(0, object);
                Some(Selection::Keep)
            }
            Command::Clear => {
                scene.objects.clear();
                Some(Selection::Deselect)
            }
        }
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0 && v <= MAX_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{ShapeKind, ShapeObject};

    fn rect(left: f32) -> SceneObject {
        SceneObject::new(
            left,
            0.0,
            ObjectKind::Shape(ShapeObject {
                shape: ShapeKind::Rect,
                width: 10.0,
                height: 10.0,
                fill: None,
                stroke: Color::BLACK,
                stroke_width: 1.0,
            }),
        )
    }

    #[test]
    fn add_selects_new_object() {
        let mut scene = Scene::default();
        let object = rect(0.0);
        let id = object.id;
        assert_eq!(Command::Add(object).apply(&mut scene), Some(Selection::Select(id)));
        assert_eq!(scene.objects.len(), 1);
    }

    #[test]
    fn unknown_id_is_not_applied() {
        let mut scene = Scene::default();
        let missing = Uuid::new_v4();
        assert!(Command::Remove(missing).apply(&mut scene).is_none());
        assert!(
            Command::Move {
                id: missing,
                left: 1.0,
                top: 1.0
            }
            .apply(&mut scene)
            .is_none()
        );
        assert!(Command::BringToFront(missing).apply(&mut scene).is_none());
    }

    #[test]
    fn duplicate_is_offset_and_on_top() {
        let mut scene = Scene::default();
        let a = rect(0.0);
        let b = rect(50.0);
        let a_id = a.id;
        scene.objects.extend([a, b]);

        let sel = Command::Duplicate {
            id: a_id,
            offset: 20.0,
        }
        .apply(&mut scene)
        .unwrap();
        let top = scene.objects.last().unwrap();
        assert_ne!(top.id, a_id);
        assert_eq!(sel, Selection::Select(top.id));
        assert_eq!((top.left, top.top), (20.0, 20.0));
    }

    #[test]
    fn z_order_commands() {
        let mut scene = Scene::default();
        let objects: Vec<_> = (0..3).map(|i| rect(i as f32)).collect();
        let ids: Vec<_> = objects.iter().map(|o| o.id).collect();
        scene.objects.extend(objects);

        Command::BringToFront(ids[0]).apply(&mut scene).unwrap();
        let order: Vec<_> = scene.objects.iter().map(|o| o.id).collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[0]]);

        Command::SendToBack(ids[2]).apply(&mut scene).unwrap();
        let order: Vec<_> = scene.objects.iter().map(|o| o.id).collect();
        assert_eq!(order, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn non_finite_geometry_is_rejected() {
        let mut scene = Scene::default();
        let object = rect(0.0);
        let id = object.id;
        scene.objects.push(object);
        assert!(
            Command::Move {
                id,
                left: f32::NAN,
                top: 0.0
            }
            .apply(&mut scene)
            .is_none()
        );
        assert!(
            Command::Resize {
                id,
                width: f32::INFINITY,
                height: 1.0
            }
            .apply(&mut scene)
            .is_none()
        );
        assert_eq!(scene.objects[0].left, 0.0);
    }

    #[test]
    fn scale_only_applies_to_images() {
        let mut scene = Scene::default();
        let object = rect(0.0);
        let id = object.id;
        scene.objects.push(object);
        assert!(
            Command::Scale {
                id,
                scale_x: 2.0,
                scale_y: 2.0
            }
            .apply(&mut scene)
            .is_none()
        );
    }

    #[test]
    fn geometry_past_the_coordinate_limit_is_rejected() {
        let mut scene = Scene::default();
        let object = rect(0.0);
        let id = object.id;
        scene.objects.push(object);
        assert!(
            Command::Move {
                id,
                left: 1e30,
                top: 0.0
            }
            .apply(&mut scene)
            .is_none()
        );
        assert!(
            Command::Duplicate {
                id,
                offset: 1e30
            }
            .apply(&mut scene)
            .is_none()
        );
        assert_eq!(scene.objects.len(), 1);

        let mut far = rect(0.0);
        far.left = 1e30;
        assert!(Command::Add(far).apply(&mut scene).is_none());
        assert_eq!(scene.check(), Ok(()));
    }
}
