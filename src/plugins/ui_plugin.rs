use bevy::prelude::*;

use crate::game::components::*;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(ScenePhase::Failed), setup_failure_text);
    }
}

#[derive(Component)]
pub struct HelpText;

/// Instruction box pinned to the top-left corner of the screen. Spawned by the
/// scene once it is fully built.
pub fn spawn_help_text(world: &mut World, text: &str) {
    world
        .spawn((
            HelpText,
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(16.0),
                top: Val::Px(16.0),
                padding: UiRect::axes(Val::Px(20.0), Val::Px(10.0)),
                ..default()
            },
            BackgroundColor(Color::WHITE),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(text),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::BLACK),
            ));
        });
}

fn setup_failure_text(mut commands: Commands) {
    commands.spawn(Camera2d);
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(16.0),
            top: Val::Px(16.0),
            ..default()
        },
        Text::new("Failed to load the town. See the log for details."),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::srgb(1.0, 0.3, 0.3)),
    ));
}
