use eframe::egui::{
    Align2, Color32, CursorIcon, Event, FontId, Painter, PointerButton, Pos2, Rect, Response, Sense, Shape,
    Stroke, Ui, vec2,
};
use skill_flow::engine::{EngineEvent, HoverInfo};
use skill_flow::render_utils::{circle_visible, with_alpha};
use skill_flow::{InputEvent, Transform};

use super::ViewModel;

const MOUSE_POINTER: u64 = 0;
const LABEL_RADIUS: f32 = 11.0;

fn draw_background(painter: &Painter, rect: Rect, transform: Transform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * transform.scale.clamp(0.6, 1.8)).max(20.0);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));
    let origin = rect.min + vec2(transform.x, transform.y);

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

impl ViewModel {
    pub(super) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let (now, delta_seconds) = ui.input(|input| {
            (input.time, input.stable_dt.clamp(1.0 / 240.0, 1.0 / 20.0))
        });

        let mut events = self.forward_input(ui, rect, &response, now);
        events.extend(self.engine.advance(delta_seconds, now));
        for event in events {
            match event {
                EngineEvent::Clicked(target) => self.last_click = Some(target),
                EngineEvent::FocusChanged(_) => self.search.clear(),
            }
        }

        draw_background(&painter, rect, self.engine.transform());
        self.paint_frame(&painter, rect);

        if let Some(hover) = self.engine.hover() {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                hover_text(hover),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if self.engine.is_dragging() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        }

        ui.ctx().request_repaint();
    }

    /// Translates egui input into engine events in canvas-local coordinates.
    fn forward_input(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &Response,
        now: f64,
    ) -> Vec<EngineEvent> {
        let mut produced = Vec::new();
        let local = |position: Pos2| position - rect.min.to_vec2();

        let size = rect.size();
        if size != self.engine.container() {
            produced.extend(self.engine.handle_input(
                InputEvent::Resize {
                    width: size.x,
                    height: size.y,
                },
                now,
            ));
        }

        let raw_events = ui.input(|input| input.events.clone());
        for event in raw_events {
            let input = match event {
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed: true,
                    ..
                } if rect.contains(pos) => {
                    self.pointer_captured = true;
                    Some(InputEvent::PointerDown {
                        pointer: MOUSE_POINTER,
                        position: local(pos),
                    })
                }
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed: false,
                    ..
                } if self.pointer_captured => {
                    self.pointer_captured = false;
                    Some(InputEvent::PointerUp {
                        pointer: MOUSE_POINTER,
                        position: local(pos),
                    })
                }
                Event::PointerMoved(pos) if self.pointer_captured || rect.contains(pos) => {
                    self.pointer_inside = true;
                    Some(InputEvent::PointerMove {
                        pointer: MOUSE_POINTER,
                        position: local(pos),
                    })
                }
                Event::PointerMoved(_) | Event::PointerGone if self.pointer_inside => {
                    self.pointer_inside = false;
                    Some(InputEvent::PointerLeave)
                }
                _ => None,
            };

            if let Some(input) = input {
                produced.extend(self.engine.handle_input(input, now));
            }
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let pointer = ui
                    .input(|input| input.pointer.hover_pos())
                    .unwrap_or_else(|| rect.center());
                produced.extend(self.engine.handle_input(
                    InputEvent::Wheel {
                        position: local(pointer),
                        delta: scroll,
                    },
                    now,
                ));
            }
        }

        produced
    }

    fn paint_frame(&self, painter: &Painter, rect: Rect) {
        let offset = rect.min.to_vec2();
        let frame = self.engine.frame();
        let zoom = self.engine.transform().scale;

        for edge in &frame.edges {
            let stroke = Stroke::new(edge.width, edge.color);
            match edge.points.as_slice() {
                [start, end] => {
                    painter.line_segment([*start + offset, *end + offset], stroke);
                }
                points if points.len() > 2 => {
                    let points = points.iter().map(|point| *point + offset).collect::<Vec<_>>();
                    painter.add(Shape::line(points, stroke));
                }
                _ => {}
            }
        }

        for particle in &frame.particles {
            let position = particle.screen + offset;
            if circle_visible(rect, position, particle.size) {
                painter.circle_filled(
                    position,
                    particle.size,
                    with_alpha(particle.color, particle.alpha),
                );
            }
        }

        for node in &frame.nodes {
            let position = node.screen + offset;
            if !circle_visible(rect, position, node.radius) {
                continue;
            }

            painter.circle_filled(position, node.radius, node.color);
            painter.circle_stroke(
                position,
                node.radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );
            if node.focused {
                painter.circle_stroke(
                    position,
                    node.radius + 4.0,
                    Stroke::new(2.0, Color32::from_rgba_unmultiplied(245, 206, 93, 200)),
                );
            }

            let show_label = self.show_labels
                && (node.focused || node.radius > LABEL_RADIUS || zoom > 1.35);
            if show_label {
                painter.text(
                    position + vec2(node.radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    node.label.as_str(),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }
    }
}

fn hover_text(hover: &HoverInfo) -> String {
    match hover {
        HoverInfo::Node {
            display_name,
            weight,
            connections,
            ..
        } => format!("{display_name}  |  weight {weight}  |  connections {connections}"),
        HoverInfo::Edge {
            from,
            to,
            kind,
            strength,
            ..
        } => format!("{from} -> {to}  |  {kind}  |  strength {strength:.1}"),
    }
}
