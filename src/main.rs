fn main() {
    shot_patterns::game::run();
}
